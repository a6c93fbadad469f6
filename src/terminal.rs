//! Terminal host
//!
//! Implements the host contract for the command line: listings and
//! resolved streams are collected during the request and printed when the
//! directory is ended.

use serde::Serialize;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::cli::{ExitCode, Output};
use crate::host::{DirectoryEntry, Host, ResolvedStream};

/// Adaptive streaming add-on reported to the controller
pub const INPUTSTREAM_ADDON: &str = "inputstream.adaptive";

/// English strings of the add-on
fn english(id: u32) -> Option<&'static str> {
    let text = match id {
        30001 => "Live TV",
        30002 => "Categories",
        30003 => "Magazines",
        30004 => "Most viewed",
        30005 => "Most recent",
        30006 => "Last chance",
        30007 => "Search",
        30201 => "Next page",
        30203 => "Play in {}",
        _ => return None,
    };
    Some(text)
}

/// Everything the request produced
#[derive(Debug, Default, Serialize)]
pub struct Listing {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub entries: Vec<DirectoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedStream>,
    pub succeeded: bool,
}

/// Host backed by stdin/stdout
pub struct TerminalHost {
    output: Output,
    media_dir: PathBuf,
    api_version: u32,
    inputstream: bool,
    query: Option<String>,
    listing: Listing,
    ended: bool,
}

impl TerminalHost {
    pub fn new(output: Output, media_dir: PathBuf) -> Self {
        Self {
            output,
            media_dir,
            api_version: 19,
            inputstream: true,
            query: None,
            listing: Listing::default(),
            ended: false,
        }
    }

    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    pub fn with_inputstream(mut self, enabled: bool) -> Self {
        self.inputstream = enabled;
        self
    }

    /// Answer the search prompt with `query` instead of reading stdin
    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Exit code of the finished request
    pub fn exit_code(&self) -> ExitCode {
        if self.listing.succeeded {
            ExitCode::Success
        } else {
            ExitCode::Error
        }
    }

    fn print_text(&self) {
        for entry in &self.listing.entries {
            let marker = if entry.is_folder { "▸" } else { "▶" };
            println!("{} {}", marker, entry.label);
            println!("    {}", entry.url);
            for action in &entry.context_menu {
                println!("    ⋯ {}: {}", action.label, action.action);
            }
        }

        if let Some(ref stream) = self.listing.resolved {
            println!("{}", stream.url);
            for (key, value) in &stream.properties {
                self.output.note(format!("  {} = {}", key, value));
            }
        }
    }
}

impl Host for TerminalHost {
    fn localized_string(&self, id: u32) -> String {
        english(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", id))
    }

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn inputstream_addon(&mut self) -> Option<String> {
        self.inputstream.then(|| INPUTSTREAM_ADDON.to_string())
    }

    fn media_path(&self, file: &str) -> String {
        self.media_dir.join(file).display().to_string()
    }

    fn input(&mut self, heading: &str) -> Option<String> {
        if let Some(query) = self.query.take() {
            return Some(query);
        }

        eprint!("{}: ", heading);
        let _ = std::io::stderr().flush();

        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim_end().to_string()),
        }
    }

    fn set_content(&mut self, content: &str) {
        self.listing.content = Some(content.to_string());
    }

    fn add_directory_item(&mut self, entry: DirectoryEntry) {
        self.listing.entries.push(entry);
    }

    fn set_resolved_url(&mut self, _succeeded: bool, stream: ResolvedStream) {
        self.listing.resolved = Some(stream);
    }

    fn end_of_directory(&mut self, succeeded: bool) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.listing.succeeded = succeeded;

        if !succeeded {
            return;
        }

        if self.output.json {
            if let Err(e) = self.output.report(&self.listing) {
                self.output.fail(&e);
                self.listing.succeeded = false;
            }
        } else {
            self.print_text();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_host() -> TerminalHost {
        TerminalHost::new(
            Output {
                json: true,
                quiet: true,
            },
            PathBuf::from("/usr/share/artetv"),
        )
    }

    #[test]
    fn test_localized_strings() {
        let host = quiet_host();
        assert_eq!(host.localized_string(30002), "Categories");
        assert_eq!(host.localized_string(30203), "Play in {}");
        assert_eq!(host.localized_string(99999), "#99999");
    }

    #[test]
    fn test_media_path() {
        let host = quiet_host();
        assert_eq!(host.media_path("search.png"), "/usr/share/artetv/search.png");
    }

    #[test]
    fn test_preset_query_is_used_once() {
        let mut host = quiet_host().with_query(Some("cinema".to_string()));
        assert_eq!(host.input("Search").as_deref(), Some("cinema"));
    }

    #[test]
    fn test_inputstream_toggle() {
        let mut host = quiet_host();
        assert_eq!(host.inputstream_addon().as_deref(), Some(INPUTSTREAM_ADDON));
        let mut host = quiet_host().with_inputstream(false);
        assert_eq!(host.inputstream_addon(), None);
    }

    #[test]
    fn test_failed_request_exit_code() {
        let mut host = quiet_host();
        host.end_of_directory(false);
        assert!(!host.listing().succeeded);
        assert_eq!(host.exit_code(), ExitCode::Error);
    }
}
