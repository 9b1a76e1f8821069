//! Credential resolution for Redfish requests.
//!
//! Three strategies, in order of precedence:
//!   1. `X-Auth-Token` session token
//!   2. username + password given up front (HTTP basic)
//!   3. interactive prompt for whatever is missing
//!
//! Nothing is checked against the BMC here; a wrong password shows up later
//! as a 401 from the first request.

use std::io::{self, BufRead, Write};

use log::debug;

/// Resolved authentication applied to every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    Basic { username: String, password: String },
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Token(_) => f.write_str("Token(***)"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// Source of credentials the operator did not pass on the command line.
pub trait Prompt {
    fn username(&mut self) -> io::Result<String>;
    fn password(&mut self) -> io::Result<String>;
}

/// Reads the username from stdin and the password from the TTY without echo.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn username(&mut self) -> io::Result<String> {
        eprint!("iDRAC username: ");
        io::stderr().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }

    fn password(&mut self) -> io::Result<String> {
        rpassword::prompt_password("iDRAC password: ")
    }
}

/// Pick the credential strategy from the supplied values.
///
/// Empty strings count as absent.
pub fn resolve(
    token:    Option<&str>,
    username: Option<&str>,
    password: Option<&str>,
    prompt:   &mut dyn Prompt,
) -> io::Result<Credentials> {
    let present = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(token) = present(token) {
        debug!("using X-Auth-Token authentication");
        return Ok(Credentials::Token(token));
    }

    let username = match present(username) {
        Some(u) => u,
        None => prompt.username()?,
    };
    let password = match present(password) {
        Some(p) => p,
        None => prompt.password()?,
    };
    debug!("using basic authentication as {username}");
    Ok(Credentials::Basic { username, password })
}
