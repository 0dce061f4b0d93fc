use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Syntax {
    Proto2,
    Proto3,
    Editions,
}

impl From<Option<&str>> for Syntax {
    fn from(optional_str: Option<&str>) -> Self {
        match optional_str {
            None | Some("") | Some("proto2") => Syntax::Proto2,
            Some("proto3") => Syntax::Proto3,
            Some("editions") => Syntax::Editions,
            Some(s) => {
                warn!("unknown syntax {:?}, treating it as proto2", s);
                Syntax::Proto2
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax() {
        assert_eq!(Syntax::from(None), Syntax::Proto2);
        assert_eq!(Syntax::from(Some("proto3")), Syntax::Proto3);
        assert_eq!(Syntax::from(Some("editions")), Syntax::Editions);
        assert_eq!(Syntax::from(Some("proto4")), Syntax::Proto2);
    }
}
