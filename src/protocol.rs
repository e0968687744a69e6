//! Text protocol parser and response generator.
//!
//! One command per line: ADD <name>, DEL <name>, LIST, HELP, QUIT.
//! The action token is case-insensitive; the argument keeps its case.
//! Every response is a single line; the framer appends the terminator.

/// Parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the usage line
    Help,

    /// List all names, sorted
    List,

    /// Add a name to the set
    Add { name: String },

    /// Delete a name from the set
    Del { name: String },

    /// Close the connection after the reply
    Quit,
}

/// Protocol parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// ADD or DEL without an argument
    MissingName,
    /// Unrecognized action token (including an empty line)
    UnknownCommand,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingName => write!(f, "Missing name. Example: ADD Juan"),
            ParseError::UnknownCommand => write!(f, "Unknown command. Type HELP"),
        }
    }
}

impl std::error::Error for ParseError {}

impl Command {
    /// Parse one raw line into a command.
    ///
    /// The first whitespace-delimited token is the action, matched
    /// case-insensitively; the remainder, trimmed, is the argument.
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let trimmed = line.trim();
        let (action, argument) = match trimmed.split_once(char::is_whitespace) {
            Some((action, rest)) => (action, rest.trim()),
            None => (trimmed, ""),
        };

        match action.to_uppercase().as_str() {
            "HELP" => Ok(Command::Help),
            "LIST" => Ok(Command::List),
            "QUIT" => Ok(Command::Quit),
            "ADD" => {
                if argument.is_empty() {
                    Err(ParseError::MissingName)
                } else {
                    Ok(Command::Add {
                        name: argument.to_string(),
                    })
                }
            }
            "DEL" => {
                if argument.is_empty() {
                    Err(ParseError::MissingName)
                } else {
                    Ok(Command::Del {
                        name: argument.to_string(),
                    })
                }
            }
            _ => Err(ParseError::UnknownCommand),
        }
    }
}

/// Check whether a name is acceptable: non-empty and free of digit
/// characters. Callers trim surrounding whitespace before validating.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.chars().any(|c| c.is_numeric())
}

/// Response generator for the line protocol
pub struct Response;

impl Response {
    /// Greeting sent on every new connection
    pub fn greeting() -> &'static str {
        "OK Connected. Type HELP"
    }

    /// Usage line for HELP
    pub fn help() -> &'static str {
        "OK Commands: ADD <name> | DEL <name> | LIST | HELP | QUIT"
    }

    /// LIST reply: sorted names, comma-space joined
    pub fn list(names: &[String]) -> String {
        if names.is_empty() {
            "OK (empty)".to_string()
        } else {
            format!("OK {}", names.join(", "))
        }
    }

    /// Successful ADD
    pub fn added() -> &'static str {
        "OK Added."
    }

    /// Successful DEL
    pub fn deleted() -> &'static str {
        "OK Deleted."
    }

    /// QUIT acknowledgement
    pub fn bye() -> &'static str {
        "OK Bye."
    }

    /// Recoverable error reply; the connection stays open
    pub fn err(msg: &str) -> String {
        format!("ERR {}", msg)
    }

    /// Rejected name argument
    pub fn invalid_name() -> String {
        Self::err("Invalid name: numeric characters are not allowed.")
    }

    /// Persistence or audit failure
    pub fn server_error(detail: &impl std::fmt::Display) -> String {
        format!("ERR Server error: {}", detail)
    }
}
