//! Command line shell: renders a template file to stdout, or runs an
//! interactive line-buffered REPL that keeps reading while brackets, string
//! literals or block comments stay open.

use std::{
    env,
    io::{self, BufRead, Write},
    path::Path,
    process::ExitCode,
};

use tempearly::{Exception, Interpreter, NullRequest, StdoutResponse};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        run_file(Path::new(&args[1]))
    } else {
        repl()
    }
}

fn new_interpreter() -> Interpreter {
    Interpreter::new(Box::new(NullRequest), Box::new(StdoutResponse))
}

fn run_file(path: &Path) -> ExitCode {
    let mut interp = new_interpreter();
    match interp.execute_file(path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(exception) => {
            show_exception(&exception);
            ExitCode::FAILURE
        }
    }
}

fn show_exception(exception: &Exception) {
    println!("{}: {}", exception.class_name, exception.message);
    for frame in &exception.traceback {
        println!("\t{frame}");
    }
}

fn repl() -> ExitCode {
    let mut interp = new_interpreter();
    let mut line_counter = 0u32;

    loop {
        let Some(source) = read_expr(&mut line_counter) else {
            return ExitCode::SUCCESS;
        };
        if source.trim().is_empty() {
            continue;
        }
        match interp.eval_expression(&source) {
            Ok(Some(repr)) => println!("=> {repr}"),
            Ok(None) => {}
            Err(exception) => show_exception(&exception),
        }
    }
}

/// Reads one logical expression, spanning further lines while delimiters
/// remain open. Returns `None` at end of input.
fn read_expr(line_counter: &mut u32) -> Option<String> {
    let mut buffer = String::new();
    let mut open_chars: Vec<u8> = Vec::new();

    loop {
        let line = read_line(line_counter)?;
        count_open_chars(line.as_bytes(), &mut open_chars);
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);
        if open_chars.is_empty() {
            return Some(buffer);
        }
    }
}

fn read_line(line_counter: &mut u32) -> Option<String> {
    *line_counter += 1;
    print!("tempearly:{:03}> ", line_counter);
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            while line.ends_with('\n') || line.ends_with('\r') {
                line.pop();
            }
            Some(line)
        }
    }
}

/// Tracks delimiters left open by the line: brackets, quotes and `/* */`
/// comments. A `#` outside any of them comments out the rest of the line.
fn count_open_chars(input: &[u8], open_chars: &mut Vec<u8>) {
    let size = input.len();
    let mut i = 0;

    while i < size {
        if let Some(&pending) = open_chars.last() {
            if pending == b'"' || pending == b'\'' {
                while i < size {
                    if input[i] == pending {
                        open_chars.pop();
                        i += 1;
                        break;
                    } else if input[i] == b'\\' && i + 1 < size {
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                if i >= size {
                    break;
                }
            } else if pending == b'*' {
                let mut closed = false;
                while i < size {
                    if input[i] == b'*' && i + 1 < size && input[i + 1] == b'/' {
                        open_chars.pop();
                        i += 2;
                        closed = true;
                        break;
                    }
                    i += 1;
                }
                if !closed {
                    break;
                }
            }
        }
        if i >= size {
            break;
        }
        match input[i] {
            b'#' => return,

            b'/' => {
                if i + 1 < size && input[i + 1] == b'*' {
                    open_chars.push(b'*');
                    i += 1;
                }
            }

            b'(' => open_chars.push(b')'),
            b'[' => open_chars.push(b']'),
            b'{' => open_chars.push(b'}'),

            closer @ (b')' | b']' | b'}') => {
                if open_chars.last() == Some(&closer) {
                    open_chars.pop();
                }
            }

            quote @ (b'\'' | b'"') => {
                open_chars.push(quote);
                i += 1;
                while i < size {
                    if input[i] == quote {
                        open_chars.pop();
                        break;
                    } else if input[i] == b'\\' && i + 1 < size {
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
            }

            _ => {}
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::count_open_chars;

    fn open_after(lines: &[&str]) -> Vec<u8> {
        let mut open = Vec::new();
        for line in lines {
            count_open_chars(line.as_bytes(), &mut open);
        }
        open
    }

    #[test]
    fn balanced_input_leaves_nothing_open() {
        assert!(open_after(&["f(x[0], {1: 2})"]).is_empty());
        assert!(open_after(&["\"quoted ( [ {\""]).is_empty());
    }

    #[test]
    fn open_delimiters_span_lines() {
        assert_eq!(open_after(&["f(function(i) :"]), vec![b')']);
        assert!(open_after(&["f(function(i) :", "i; end function)"]).is_empty());
        assert_eq!(open_after(&["x = 'still going"]), vec![b'\'']);
        assert!(open_after(&["x = 'still going", "done';"]).is_empty());
    }

    #[test]
    fn comments_are_tracked() {
        assert_eq!(open_after(&["/* open"]), vec![b'*']);
        assert!(open_after(&["/* open", "still */ 1"]).is_empty());
        // A line comment hides everything after it.
        assert!(open_after(&["1 # ( [ {"]).is_empty());
    }

    #[test]
    fn escaped_quotes_do_not_close_strings() {
        assert_eq!(open_after(&["x = \"a\\\""]), vec![b'"']);
        assert!(open_after(&["x = \"a\\\"b\";"]).is_empty());
    }
}
