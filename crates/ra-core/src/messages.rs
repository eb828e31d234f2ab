//! Fixed reply texts, keyed so tests can assert on which reply was sent.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply {
    Help,
    Hello,
    UnknownCommand,
    NoSavedPages,
    Saved,
    AlreadyExists,
}

const HELP: &str = "I can keep pages for you and offer them back when you have time to read.

To save a page, just send me a link to it.

To get a random page from your list, send /rnd.
Note: the page is removed from your list once I send it to you.";

const HELLO: &str = "Hi there! 👾

I can keep pages for you and offer them back when you have time to read.

To save a page, just send me a link to it.

To get a random page from your list, send /rnd.
Note: the page is removed from your list once I send it to you.";

impl Reply {
    pub fn text(self) -> &'static str {
        match self {
            Reply::Help => HELP,
            Reply::Hello => HELLO,
            Reply::UnknownCommand => "Unknown command 🤔",
            Reply::NoSavedPages => "You have no saved pages 🙊",
            Reply::Saved => "Saved! 👌",
            Reply::AlreadyExists => "You already have this page in your list 🤗",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_includes_help() {
        assert!(Reply::Hello.text().ends_with(Reply::Help.text()));
    }
}
