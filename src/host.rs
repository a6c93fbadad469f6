//! Host media-center contract
//!
//! The add-on never renders anything itself. It hands plain directory
//! entries and resolved streams to a [`Host`], which owns listing UI,
//! playback, localization and the adaptive streaming helper.

use serde::Serialize;

use crate::models::{Art, InfoLabels, Properties};

/// Entry point URL of the add-on when none is given
pub const DEFAULT_BASE_URL: &str = "plugin://plugin.video.artetv/";

/// Host application primitives used by the navigation controller
pub trait Host {
    /// Localized string for a numeric string id
    fn localized_string(&self, id: u32) -> String;

    /// Major version of the host API (decides property names)
    fn api_version(&self) -> u32;

    /// Id of the adaptive streaming add-on, if installed and usable
    fn inputstream_addon(&mut self) -> Option<String>;

    /// Path or URL of a media file bundled with the add-on
    fn media_path(&self, file: &str) -> String;

    /// Add-on fanart used when an entry has none
    fn addon_fanart(&self) -> Option<String> {
        None
    }

    /// Prompt for free text; `None` when cancelled
    fn input(&mut self, heading: &str) -> Option<String>;

    fn set_content(&mut self, content: &str);

    fn add_directory_item(&mut self, entry: DirectoryEntry);

    fn set_resolved_url(&mut self, succeeded: bool, stream: ResolvedStream);

    /// Close the current listing; called exactly once per request
    fn end_of_directory(&mut self, succeeded: bool);
}

/// Context menu action attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextAction {
    pub label: String,
    pub action: String,
}

/// Listing row as rendered by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    pub url: String,
    pub label: String,
    pub is_folder: bool,
    pub info: InfoLabels,
    pub art: Art,
    pub properties: Properties,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub context_menu: Vec<ContextAction>,
}

/// Playable stream handed to the host's player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedStream {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub properties: Properties,
}

/// Open listing of one request
///
/// Ends the host directory when dropped, so it is closed exactly once
/// whether the request succeeds, fails or is abandoned halfway.
pub struct Directory<'a, H: Host> {
    host: &'a mut H,
    succeeded: bool,
}

impl<'a, H: Host> Directory<'a, H> {
    pub fn open(host: &'a mut H) -> Self {
        Self {
            host,
            succeeded: false,
        }
    }

    pub fn host(&mut self) -> &mut H {
        self.host
    }

    pub fn succeed(&mut self) {
        self.succeeded = true;
    }
}

impl<H: Host> Drop for Directory<'_, H> {
    fn drop(&mut self) {
        self.host.end_of_directory(self.succeeded);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHost {
        ended: Vec<bool>,
    }

    impl Host for CountingHost {
        fn localized_string(&self, id: u32) -> String {
            id.to_string()
        }
        fn api_version(&self) -> u32 {
            19
        }
        fn inputstream_addon(&mut self) -> Option<String> {
            None
        }
        fn media_path(&self, file: &str) -> String {
            file.to_string()
        }
        fn input(&mut self, _heading: &str) -> Option<String> {
            None
        }
        fn set_content(&mut self, _content: &str) {}
        fn add_directory_item(&mut self, _entry: DirectoryEntry) {}
        fn set_resolved_url(&mut self, _succeeded: bool, _stream: ResolvedStream) {}
        fn end_of_directory(&mut self, succeeded: bool) {
            self.ended.push(succeeded);
        }
    }

    #[test]
    fn test_directory_ends_once_on_success() {
        let mut host = CountingHost::default();
        {
            let mut directory = Directory::open(&mut host);
            directory.host().set_content("movies");
            directory.succeed();
        }
        assert_eq!(host.ended, vec![true]);
    }

    #[test]
    fn test_directory_ends_on_early_exit() {
        fn fails(host: &mut CountingHost) -> Result<(), &'static str> {
            let _directory = Directory::open(host);
            Err("boom")
        }

        let mut host = CountingHost::default();
        assert!(fails(&mut host).is_err());
        assert_eq!(host.ended, vec![false]);
    }
}
