// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

/// Map a media path to its MIME type by extension
///
/// Unknown extensions yield `None`; callers decide whether that matters.
pub fn mime_type_for(media_path: &str) -> Option<&'static str> {
    let ext = Path::new(media_path).extension()?.to_str()?;

    match ext.to_lowercase().as_str() {
        "wav" | "wave" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        _ => None,
    }
}
