//! Confirmation of destructive catalog actions.

use std::io::{BufRead, Write};

use crate::domain::track::TrackRecord;

pub trait Confirmation {
    fn confirm_delete(&mut self, track: &TrackRecord) -> bool;
}

/// Confirms everything, for `--yes` and already confirmed HTTP requests.
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm_delete(&mut self, _track: &TrackRecord) -> bool {
        true
    }
}

/// Asks on a line based terminal. Anything but `y`/`yes` declines.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirmation for Prompt<R, W> {
    fn confirm_delete(&mut self, track: &TrackRecord) -> bool {
        let asked = write!(
            self.output,
            "Are you sure you want to delete \"{}\"? [y/N] ",
            track.title
        )
        .and_then(|_| self.output.flush());
        if let Err(e) = asked {
            log::warn!("could not show confirmation prompt: {e}");
            return false;
        }

        let mut answer = String::new();
        match self.input.read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(e) => {
                log::warn!("could not read confirmation: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed::seed_tracks;

    #[test]
    fn prompt_accepts_yes() {
        let track = &seed_tracks()[0];
        let mut out = Vec::new();
        let mut prompt = Prompt::new(&b"yes\n"[..], &mut out);

        assert!(prompt.confirm_delete(track));
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Perfect Cover"));
    }

    #[test]
    fn prompt_declines_by_default() {
        let track = &seed_tracks()[0];
        let mut prompt = Prompt::new(&b"\n"[..], Vec::new());
        assert!(!prompt.confirm_delete(track));

        let mut prompt = Prompt::new(&b""[..], Vec::new());
        assert!(!prompt.confirm_delete(track));
    }
}
