/// Error codes for Grebe diagnostics.
/// E01xx = parse errors
/// E02xx = type errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Parse errors
    E0100, // unexpected character
    E0101, // unexpected token
    E0102, // unclosed delimiter
    E0103, // malformed form

    // Type errors
    E0200, // type mismatch
    E0201, // unbound variable
    E0202, // arity mismatch
    E0203, // infinite type
    E0204, // unknown primitive
    E0205, // empty program
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E0100 => "E0100",
            ErrorCode::E0101 => "E0101",
            ErrorCode::E0102 => "E0102",
            ErrorCode::E0103 => "E0103",
            ErrorCode::E0200 => "E0200",
            ErrorCode::E0201 => "E0201",
            ErrorCode::E0202 => "E0202",
            ErrorCode::E0203 => "E0203",
            ErrorCode::E0204 => "E0204",
            ErrorCode::E0205 => "E0205",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            ErrorCode::E0100 | ErrorCode::E0101 | ErrorCode::E0102 | ErrorCode::E0103 => "parse",
            ErrorCode::E0200
            | ErrorCode::E0201
            | ErrorCode::E0202
            | ErrorCode::E0203
            | ErrorCode::E0204
            | ErrorCode::E0205 => "type",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ErrorCode::E0100 => "unexpected character",
            ErrorCode::E0101 => "unexpected token",
            ErrorCode::E0102 => "unclosed delimiter",
            ErrorCode::E0103 => "malformed form",
            ErrorCode::E0200 => "type mismatch",
            ErrorCode::E0201 => "unbound variable",
            ErrorCode::E0202 => "arity mismatch",
            ErrorCode::E0203 => "infinite type",
            ErrorCode::E0204 => "unknown primitive",
            ErrorCode::E0205 => "empty program",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
