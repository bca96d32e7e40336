//! Input line commands.
//!
//! Lines starting with `/` are commands; anything else is a chat message.
//!
//! | command                        | effect                             |
//! |--------------------------------|------------------------------------|
//! | `/register <user> <pass>`      | create an account                  |
//! | `/connect <user> <pass>`       | log in (alias `/login`)            |
//! | `/close`                       | end the session                    |
//! | `/quit`                        | exit (alias `/q`)                  |
//!
//! Missing credentials are passed through empty so the session controller
//! reports them the same way for every frontend.

/// Parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/register <user> <pass>`
    Register {
        /// Account name, possibly empty.
        username: String,
        /// Password, possibly empty.
        password: String,
    },
    /// `/connect <user> <pass>` or `/login <user> <pass>`
    Connect {
        /// Account name, possibly empty.
        username: String,
        /// Password, possibly empty.
        password: String,
    },
    /// `/close`
    Close,
    /// `/quit`
    Quit,
    /// Plain text to send.
    Message {
        /// Text exactly as typed.
        content: String,
    },
    /// `/something` we do not know.
    Unknown {
        /// Command name without the slash.
        input: String,
    },
    /// Known command with the wrong arguments.
    InvalidArgs {
        /// Command name without the slash.
        command: String,
        /// What is wrong.
        error: String,
    },
}

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Message { content: line.to_string() };
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    match name {
        "register" | "connect" | "login" => {
            if args.len() > 2 {
                return Command::InvalidArgs {
                    command: name.to_string(),
                    error: format!("usage: /{name} <username> <password>"),
                };
            }
            let username = args.first().copied().unwrap_or_default().to_string();
            let password = args.get(1).copied().unwrap_or_default().to_string();
            if name == "register" {
                Command::Register { username, password }
            } else {
                Command::Connect { username, password }
            }
        },
        "close" | "disconnect" => no_args(name, &args, Command::Close),
        "quit" | "q" => no_args(name, &args, Command::Quit),
        _ => Command::Unknown { input: name.to_string() },
    }
}

fn no_args(name: &str, args: &[&str], command: Command) -> Command {
    if args.is_empty() {
        command
    } else {
        Command::InvalidArgs { command: name.to_string(), error: "takes no arguments".to_string() }
    }
}
