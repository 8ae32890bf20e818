use crate::gateway::SourceScope;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  <text>                       send a message
  /send                        send the transcribed input
  /record, /stop               start / stop voice input
  /speak <n>                   read message #n aloud
  /mute                        stop reading aloud
  /upload <path.pdf>           upload a PDF catalog
  /website <url>               load website content
  /clear pdf|website|all       clear loaded knowledge (all also resets the chat)
  /history clear               clear the chat history
  /status                      show backend status
  /login <email> <password>
  /signup <name> <email> <password>
  /logout
  /quit";

/// A parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    Send(String),
    SendInput,
    StartRecording,
    StopRecording,
    Speak(usize),
    StopSpeech,
    Upload(PathBuf),
    LoadWebsite(String),
    ClearSources(SourceScope),
    ClearHistory,
    Status,
    Login { email: String, password: String },
    Signup { name: String, email: String, password: String },
    Logout,
    Help,
    Quit,
}

impl DashboardCommand {
    /// `Ok(None)` for blank lines; `Err` carries a usage hint
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        if !line.starts_with('/') {
            return Ok(Some(DashboardCommand::Send(line.to_string())));
        }

        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        let command = match (name, args.as_slice()) {
            ("/send", []) => DashboardCommand::SendInput,
            ("/record", []) => DashboardCommand::StartRecording,
            ("/stop", []) => DashboardCommand::StopRecording,
            ("/speak", [n]) => match n.parse::<usize>() {
                Ok(n) if n > 0 => DashboardCommand::Speak(n),
                _ => return Err("usage: /speak <message number>".into()),
            },
            ("/mute", []) => DashboardCommand::StopSpeech,
            ("/upload", [_, ..]) => {
                let path = line["/upload".len()..].trim();
                DashboardCommand::Upload(PathBuf::from(path))
            }
            ("/website", [url]) => DashboardCommand::LoadWebsite(url.to_string()),
            ("/clear", [scope]) => match SourceScope::parse(scope) {
                Some(scope) => DashboardCommand::ClearSources(scope),
                None => return Err("usage: /clear pdf|website|all".into()),
            },
            ("/history", ["clear"]) => DashboardCommand::ClearHistory,
            ("/status", []) => DashboardCommand::Status,
            ("/login", [email, password]) => DashboardCommand::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("/signup", [name, email, password]) => DashboardCommand::Signup {
                name: name.to_string(),
                email: email.to_string(),
                password: password.to_string(),
            },
            ("/logout", []) => DashboardCommand::Logout,
            ("/help", _) => DashboardCommand::Help,
            ("/quit", []) | ("/exit", []) => DashboardCommand::Quit,
            _ => return Err(format!("unknown command {:?}, try /help", line)),
        };

        Ok(Some(command))
    }

    /// Whether the command talks to the backend on the user's behalf
    pub fn requires_auth(&self) -> bool {
        !matches!(
            self,
            DashboardCommand::Login { .. }
                | DashboardCommand::Signup { .. }
                | DashboardCommand::Help
                | DashboardCommand::Quit
                | DashboardCommand::StopSpeech
        )
    }
}
