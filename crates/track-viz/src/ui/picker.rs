//! Native file picker.

use std::path::PathBuf;

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "ogg", "flac", "wma", "mp4", "mpeg", "m4a", "opus", "webm", "avi", "mov",
    "3gp",
];

/// Ask the user for an audio file. `None` when the dialog is cancelled.
pub fn pick_audio_file() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select Audio File")
        .add_filter("Audio/Video Files", AUDIO_EXTENSIONS)
        .pick_file()
}
