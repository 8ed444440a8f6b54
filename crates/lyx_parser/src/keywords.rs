/// Try to get a keyword from a string, ignoring string casing.
pub fn keyword_from_str(s: &str) -> Option<Keyword> {
    let s = unicase::Ascii::new(s);
    let idx = match KEYWORD_STRINGS.binary_search(&s) {
        Ok(idx) => idx,
        Err(_) => return None,
    };
    Some(ALL_KEYWORDS[idx])
}

/// Generate an enum of keywords.
///
/// Keywords must be listed in alphabetical order, lookups binary search the
/// generated string table.
macro_rules! define_keywords {
    ($($ident:ident),*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Keyword {
            $($ident),*
        }

        pub const ALL_KEYWORDS: &[Keyword] = &[
            $(Keyword::$ident),*
        ];

        pub const KEYWORD_STRINGS: &[unicase::Ascii<&'static str>] = &[
            $(unicase::Ascii::new(stringify!($ident)),)*
        ];
    };
}

#[rustfmt::skip]
define_keywords!(
    ABORT,
    ALL,
    ALTER,
    ANALYZE,
    AND,
    AS,
    BEGIN,
    BY,
    CHECK,
    CLUSTER,
    COMMIT,
    CONSTRAINT,
    COPY,
    CREATE,
    CROSS,
    DATABASE,
    DELETE,
    DROP,
    END,
    EXCEPT,
    EXECUTE,
    EXISTS,
    EXPLAIN,
    FALSE,
    FOREIGN,
    FROM,
    FULL,
    GROUP,
    HAVING,
    IF,
    INDEX,
    INNER,
    INSERT,
    INTERSECT,
    INTO,
    IS,
    JOIN,
    LEFT,
    LIKE,
    LIMIT,
    LOCAL,
    NATURAL,
    NOT,
    NULL,
    OFFSET,
    ON,
    OR,
    ORDER,
    OUTER,
    PREPARE,
    PRIMARY,
    RESET,
    RETURNING,
    RIGHT,
    ROLE,
    ROLLBACK,
    SELECT,
    SESSION,
    SET,
    START,
    TABLE,
    TEMP,
    TEMPORARY,
    TIME,
    TO,
    TRANSACTION,
    TRUE,
    TRUNCATE,
    UNION,
    UNIQUE,
    UPDATE,
    USER,
    USING,
    VACUUM,
    VALUES,
    VERBOSE,
    WHERE,
    WITH,
    WORK,
    ZONE
);

/// Keywords that cannot be used as an implicit (no AS) table alias.
pub const RESERVED_FOR_TABLE_ALIAS: &[Keyword] = &[
    Keyword::CROSS,
    Keyword::EXCEPT,
    Keyword::FROM,
    Keyword::FULL,
    Keyword::GROUP,
    Keyword::HAVING,
    Keyword::INNER,
    Keyword::INTERSECT,
    Keyword::JOIN,
    Keyword::LEFT,
    Keyword::LIMIT,
    Keyword::NATURAL,
    Keyword::OFFSET,
    Keyword::ON,
    Keyword::ORDER,
    Keyword::OUTER,
    Keyword::RETURNING,
    Keyword::RIGHT,
    Keyword::SELECT,
    Keyword::SET,
    Keyword::TO,
    Keyword::UNION,
    Keyword::USING,
    Keyword::VALUES,
    Keyword::WHERE,
    Keyword::WITH,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        // (input, expected)
        let tests = [
            ("select", Some(Keyword::SELECT)),
            ("SeLeCt", Some(Keyword::SELECT)),
            ("SELECT", Some(Keyword::SELECT)),
            ("NOSELECT", None),
            ("local", Some(Keyword::LOCAL)),
            ("rollback", Some(Keyword::ROLLBACK)),
            ("statement_timeout", None),
        ];

        for (input, expected) in tests {
            let got = keyword_from_str(input);
            assert_eq!(expected, got);
        }
    }

    #[test]
    fn keyword_strings_sorted() {
        for pair in KEYWORD_STRINGS.windows(2) {
            assert!(pair[0] < pair[1], "{} sorts after {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn every_keyword_resolves() {
        for (s, kw) in KEYWORD_STRINGS.iter().zip(ALL_KEYWORDS) {
            assert_eq!(Some(*kw), keyword_from_str(s));
        }
    }
}
