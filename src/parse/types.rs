//! Types produced by the parser and consumed by the dispatcher.

/// One command invocation derived from an input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The first word of the line.
    pub name: String,
    /// The remaining words, in order.
    pub args: Vec<String>,
}

impl Invocation {
    /// Split tokenized words into name and arguments. `None` for no words.
    pub fn from_words(mut words: Vec<String>) -> Option<Self> {
        if words.is_empty() {
            return None;
        }
        let name = words.remove(0);
        Some(Self { name, args: words })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_word_is_name() {
        let inv = Invocation::from_words(vec!["echo".into(), "a".into(), "b".into()]).unwrap();
        assert_eq!(inv.name, "echo");
        assert_eq!(inv.args, vec!["a", "b"]);
    }

    #[test]
    fn no_words_no_invocation() {
        assert_eq!(Invocation::from_words(Vec::new()), None);
    }
}
