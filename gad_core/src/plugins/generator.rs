//! Plugin scaffolding.
//!
//! Writes a starter module for a new bridge type. An existing file is never
//! overwritten.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::errors::{GadError, GadResult};
use crate::plugins::discovery::MODULE_EXTENSION;

/// `"slab bridge"` -> `"SlabBridgePlugin"`
pub fn class_name(display_name: &str) -> String {
    let mut titled = String::with_capacity(display_name.len());
    let mut prev_is_alpha = false;
    for c in display_name.chars() {
        if c.is_alphabetic() {
            if prev_is_alpha {
                titled.extend(c.to_lowercase());
            } else {
                titled.extend(c.to_uppercase());
            }
            prev_is_alpha = true;
        } else {
            prev_is_alpha = false;
            titled.push(c);
        }
    }

    let mut name: String = titled.chars().filter(|c| !c.is_whitespace()).collect();
    name.push_str("Plugin");
    name
}

/// `"Slab Bridge"` -> `"slab_bridge.toml"`
pub fn module_file_name(display_name: &str) -> String {
    let stem: String = display_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}.{}", stem, MODULE_EXTENSION)
}

/// Starter module text for `display_name`
pub fn template(display_name: &str) -> String {
    let quoted = |s: &str| toml::Value::String(s.to_string()).to_string();

    format!(
        "# Auto-generated plugin module for {name}.\n\
         # Replace [plugin.run] with the real design action.\n\
         \n\
         [[plugin]]\n\
         class = {class}\n\
         name = {quoted_name}\n\
         version = \"1.0.0\"\n\
         author = \"Bridge_GAD Auto Generator\"\n\
         description = {description}\n\
         \n\
         [plugin.run]\n\
         kind = \"message\"\n\
         title = {quoted_name}\n\
         text = {text}\n",
        name = display_name.replace('\n', " "),
        class = quoted(&class_name(display_name)),
        quoted_name = quoted(display_name),
        description = quoted(&format!("Auto-generated module for {} design.", display_name)),
        text = quoted(&format!("This is a placeholder for {} module.", display_name)),
    )
}

/// Create a starter module in `plugin_dir`. Returns the new file's path.
///
/// Fails with `DuplicatePlugin` if the target file already exists.
pub fn create_plugin(plugin_dir: &Path, display_name: &str) -> GadResult<PathBuf> {
    let display_name = display_name.trim();
    if display_name.is_empty() {
        return Err(GadError::invalid_input("name", display_name, "plugin name must not be blank"));
    }
    if display_name.contains(['/', '\\']) {
        return Err(GadError::invalid_input(
            "name",
            display_name,
            "plugin name must not contain path separators",
        ));
    }

    fs::create_dir_all(plugin_dir)
        .map_err(|e| GadError::file_error("create directory", plugin_dir.display().to_string(), e.to_string()))?;

    let path = plugin_dir.join(module_file_name(display_name));
    let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(GadError::duplicate_plugin(display_name, path.display().to_string()));
        }
        Err(e) => return Err(GadError::file_error("create", path.display().to_string(), e.to_string())),
    };

    fill_module(file, &path, &template(display_name))?;

    tracing::info!(plugin = display_name, path = %path.display(), "created plugin module");
    Ok(path)
}

/// Write a freshly created module, removing it again if the write fails
/// so a later attempt is not refused as a duplicate.
fn fill_module<W: Write>(mut file: W, path: &Path, contents: &str) -> GadResult<()> {
    let written = file.write_all(contents.as_bytes()).and_then(|()| file.flush());
    drop(file);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %cleanup, "could not remove partial plugin module");
        }
        return Err(GadError::file_error("write", path.display().to_string(), e.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::contract::{BridgePlugin, PluginAction};
    use crate::plugins::discovery::discover;
    use tempfile::TempDir;

    #[test]
    fn test_class_name() {
        assert_eq!(class_name("Slab Bridge"), "SlabBridgePlugin");
        assert_eq!(class_name("psc girder"), "PscGirderPlugin");
        assert_eq!(class_name("box-culvert design"), "Box-CulvertDesignPlugin");
    }

    #[test]
    fn test_module_file_name() {
        assert_eq!(module_file_name("Slab Bridge"), "slab_bridge.toml");
        assert_eq!(module_file_name("PSC  Girder"), "psc__girder.toml");
    }

    #[test]
    fn test_generated_module_is_discoverable() {
        let dir = TempDir::new().unwrap();
        let path = create_plugin(dir.path(), "Slab Bridge").unwrap();
        assert_eq!(path, dir.path().join("slab_bridge.toml"));

        let discovery = discover(dir.path());
        assert!(discovery.failures.is_empty());
        let plugin = discovery.find("Slab Bridge").unwrap();
        assert_eq!(plugin.class_name.as_deref(), Some("SlabBridgePlugin"));
        assert_eq!(plugin.description(), "Auto-generated module for Slab Bridge design.");
        assert_eq!(
            plugin.action,
            Some(PluginAction::Message {
                title: Some("Slab Bridge".to_string()),
                text: "This is a placeholder for Slab Bridge module.".to_string(),
            })
        );
    }

    #[test]
    fn test_never_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = create_plugin(dir.path(), "Slab Bridge").unwrap();
        fs::write(&path, "# edited by hand\n").unwrap();

        let err = create_plugin(dir.path(), "Slab Bridge").unwrap_err();
        assert_eq!(err.error_code(), "DUPLICATE_PLUGIN");
        assert_eq!(fs::read_to_string(&path).unwrap(), "# edited by hand\n");
    }

    #[test]
    fn test_quotes_are_escaped() {
        let dir = TempDir::new().unwrap();
        create_plugin(dir.path(), "Arch \"Type\" Bridge").unwrap();
        assert!(discover(dir.path()).find("Arch \"Type\" Bridge").is_some());
    }

    /// Accepts a few bytes, then reports a full disk
    struct FullDisk {
        room: usize,
    }

    impl Write for FullDisk {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.room == 0 {
                return Err(std::io::Error::other("no space left on device"));
            }
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_write_leaves_no_module() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(module_file_name("Slab Bridge"));
        fs::write(&path, "[[plugin]]\nna").unwrap();

        let err = fill_module(FullDisk { room: 12 }, &path, &template("Slab Bridge")).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ERROR");
        assert!(!path.exists());

        // the name is free again
        assert_eq!(create_plugin(dir.path(), "Slab Bridge").unwrap(), path);
    }

    #[test]
    fn test_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        assert!(create_plugin(dir.path(), "   ").is_err());
        assert!(create_plugin(dir.path(), "../escape").is_err());
    }
}
