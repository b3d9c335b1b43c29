use std::io::{BufRead, Write};

use color_eyre::{Result, eyre::bail};
use engine::{book::BookQuery, persist::file_stem};

/// Prints `question` and reads one line. `None` means the input is closed.
pub fn ask(
    input: &mut impl BufRead,
    out: &mut impl Write,
    question: &str,
) -> Result<Option<String>> {
    write!(out, "{question}")?;
    out.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Asks until a non-blank answer is given.
pub fn ask_required(
    input: &mut impl BufRead,
    out: &mut impl Write,
    question: &str,
) -> Result<String> {
    loop {
        match ask(input, out, question)? {
            Some(answer) if !answer.trim().is_empty() => return Ok(answer),
            Some(_) => writeln!(out, "This field is required.")?,
            None => bail!("Input closed before {question:?} was answered"),
        }
    }
}

pub fn read_book_query(input: &mut impl BufRead, out: &mut impl Write) -> Result<BookQuery> {
    let title = loop {
        let title = ask_required(input, out, "Enter the book title: ")?;
        match file_stem(&title) {
            Ok(_) => break title,
            Err(e) => writeln!(out, "{e}")?,
        }
    };
    let author = ask_required(input, out, "Enter the author's name: ")?;
    let isbn = ask(input, out, "Enter ISBN (optional): ")?;
    let publisher = ask(input, out, "Enter publisher (optional): ")?;

    Ok(BookQuery::try_new(title, author, isbn, publisher)?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read(input: &str) -> (Result<BookQuery>, String) {
        let mut out = Vec::new();
        let query = read_book_query(&mut Cursor::new(input), &mut out);
        (query, String::from_utf8(out).unwrap())
    }

    #[test]
    fn prompts_in_order() {
        let (query, out) = read("Test Book\nA. Author\n\n\n");
        let query = query.unwrap();

        assert_eq!(
            out,
            "Enter the book title: Enter the author's name: Enter ISBN (optional): Enter publisher (optional): "
        );
        assert_eq!(query.title(), "Test Book");
        assert_eq!(query.author(), "A. Author");
        assert_eq!(query.isbn(), None);
        assert_eq!(query.publisher(), None);
    }

    #[test]
    fn optional_fields_are_kept() {
        let (query, _) = read("Test Book\r\nA. Author\r\n9788936434120\r\n창비\r\n");
        let query = query.unwrap();
        assert_eq!(query.isbn(), Some("9788936434120"));
        assert_eq!(query.publisher(), Some("창비"));
    }

    #[test]
    fn blank_title_is_asked_again() {
        let (query, out) = read("\n   \nTest Book\nA. Author\n");
        assert_eq!(query.unwrap().title(), "Test Book");
        assert_eq!(out.matches("This field is required.").count(), 2);
    }

    #[test]
    fn title_without_usable_file_name_is_asked_again() {
        let (query, out) = read("///\nTest Book\nA. Author\n");
        assert_eq!(query.unwrap().title(), "Test Book");
        assert!(out.contains("can't be used as a file name"));
    }

    #[test]
    fn closed_input_without_optionals() {
        let (query, _) = read("Test Book\nA. Author\n");
        let query = query.unwrap();
        assert_eq!(query.isbn(), None);
        assert_eq!(query.publisher(), None);
    }

    #[test]
    fn closed_input_before_author() {
        let (query, _) = read("Test Book\n");
        assert!(query.is_err());
    }
}
