use crate::compositor::{Position, WatermarkParams};
use crate::error::Result;
use crate::params::{self, Job, CATEGORY, KEY_WATERMARK_PATH};
use crate::store::DefaultStore;
use crate::util::resolve_path;
use log::debug;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const QUIT: &str = "q";

macro_rules! or_quit {
    ($e:expr) => {
        match $e {
            Some(value) => value,
            None => return Ok(None),
        }
    };
}

/// Asks for parameters on `output` and reads answers from `input`, repeating
/// each question until the answer is usable.
///
/// Every method returns `Ok(None)` once the user types `q` or input runs out.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            debug!("Input closed while prompting");
            return Ok(None);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case(QUIT) {
            return Ok(None);
        }
        Ok(Some(answer.to_string()))
    }

    fn complain(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "[Error] {}", message)?;
        Ok(())
    }

    /// Asks until the answer names an existing file. Bare file names are
    /// looked up in `base_dir`.
    pub fn image_path(&mut self, what: &str, base_dir: &Path) -> Result<Option<PathBuf>> {
        let question = format!("Enter the path to the {} ('{}' to exit): ", what, QUIT);
        loop {
            let answer = or_quit!(self.ask(&question)?);
            if !answer.is_empty() {
                let path = resolve_path(&answer, base_dir);
                if path.is_file() {
                    return Ok(Some(path));
                }
                debug!("{} does not exist", path.display());
            }
            self.complain("Image file does not exist. Retry...")?;
        }
    }

    fn number(&mut self, question: &str, default: f64, validate: fn(f64) -> Result<f64>) -> Result<Option<f64>> {
        loop {
            let answer = or_quit!(self.ask(question)?);
            if answer.is_empty() {
                return Ok(Some(default));
            }
            match answer.parse::<f64>() {
                Ok(number) => match validate(number) {
                    Ok(number) => return Ok(Some(number)),
                    Err(e) => self.complain(&format!("{}. Retry...", e))?,
                },
                Err(_) => self.complain("Invalid numerical input, must be a number. Retry...")?,
            }
        }
    }

    pub fn opacity(&mut self, default: f64) -> Result<Option<f64>> {
        let question = format!("Enter the watermark opacity (0-1, default {}): ", default);
        self.number(&question, default, params::validate_opacity)
    }

    pub fn scale(&mut self, default: f64) -> Result<Option<f64>> {
        let question = format!("Enter the watermark scaling percentage (default {}): ", default);
        self.number(&question, default, params::validate_scale)
    }

    pub fn border(&mut self, default: f64) -> Result<Option<f64>> {
        let question = format!("Enter the watermark border percentage (default {}): ", default);
        self.number(&question, default, params::validate_border)
    }

    pub fn position(&mut self, default: Position) -> Result<Option<Position>> {
        let names = Position::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let question = format!("Enter the watermark position ({}, default {}): ", names, default);
        loop {
            let answer = or_quit!(self.ask(&question)?);
            if answer.is_empty() {
                return Ok(Some(default));
            }
            match answer.parse() {
                Ok(position) => return Ok(Some(position)),
                Err(_) => self.complain(&format!("Invalid watermark position. Choose from {}. Retry...", names))?,
            }
        }
    }

    /// Runs the whole interactive session, remembering the watermark and each
    /// tunable in `store` as soon as it is accepted.
    pub fn collect<S>(&mut self, base_dir: &Path, defaults: &WatermarkParams, store: &mut S) -> Result<Option<Job>>
    where
        S: DefaultStore + ?Sized,
    {
        let original = or_quit!(self.image_path("original image", base_dir)?);
        let watermark = or_quit!(self.image_path("watermark image", base_dir)?);
        store.set(CATEGORY, KEY_WATERMARK_PATH, &watermark.to_string_lossy())?;

        let opacity = or_quit!(self.opacity(defaults.opacity)?);
        store.set(CATEGORY, params::KEY_OPACITY, &opacity.to_string())?;
        let position = or_quit!(self.position(defaults.position)?);
        store.set(CATEGORY, params::KEY_POSITION, position.as_str())?;
        let scale_percentage = or_quit!(self.scale(defaults.scale_percentage)?);
        store.set(CATEGORY, params::KEY_SCALE, &scale_percentage.to_string())?;
        let border_percentage = or_quit!(self.border(defaults.border_percentage)?);
        store.set(CATEGORY, params::KEY_BORDER, &border_percentage.to_string())?;

        Ok(Some(Job {
            original,
            watermark,
            params: WatermarkParams {
                opacity,
                position,
                scale_percentage,
                border_percentage,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::fs;
    use std::io::Cursor;
    use tempfile::{tempdir, TempDir};

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn transcript(prompter: &Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.output.clone()).unwrap()
    }

    fn images() -> TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("photo.png"), b"x").unwrap();
        fs::write(dir.path().join("logo.png"), b"x").unwrap();
        dir
    }

    #[test]
    fn image_path_retries_until_the_file_exists() {
        let dir = images();
        let photo = dir.path().join("photo.png");
        let mut p = prompter(&format!("\nnope.png\n{}\n", photo.display()));

        assert_eq!(p.image_path("original image", Path::new("/elsewhere")).unwrap(), Some(photo));
        assert_eq!(transcript(&p).matches("[Error] Image file does not exist").count(), 2);
    }

    #[test]
    fn bare_names_are_found_in_base_dir() {
        let dir = images();
        let mut p = prompter("logo.png\n");
        assert_eq!(
            p.image_path("watermark image", dir.path()).unwrap(),
            Some(dir.path().join("logo.png"))
        );
    }

    #[test]
    fn directories_are_not_images() {
        let dir = images();
        let mut p = prompter(&format!("{}\n", dir.path().display()));
        assert_eq!(p.image_path("original image", dir.path()).unwrap(), None);
        assert!(transcript(&p).contains("[Error]"));
    }

    #[test]
    fn q_quits_from_any_prompt() {
        let dir = images();
        assert_eq!(prompter("Q\n").image_path("original image", dir.path()).unwrap(), None);
        assert_eq!(prompter("q\n").opacity(1.0).unwrap(), None);
        assert_eq!(prompter(" q \n").position(Position::Centered).unwrap(), None);
        assert_eq!(prompter("").border(2.0).unwrap(), None);
    }

    #[test]
    fn empty_answers_take_the_default() {
        assert_eq!(prompter("\n").opacity(0.4).unwrap(), Some(0.4));
        assert_eq!(prompter("\n").scale(5.0).unwrap(), Some(5.0));
        assert_eq!(prompter("\n").border(2.0).unwrap(), Some(2.0));
        assert_eq!(prompter("\n").position(Position::TopRight).unwrap(), Some(Position::TopRight));
    }

    #[test]
    fn bad_numbers_are_asked_again() {
        let mut p = prompter("abc\n1.5\n0\n");
        assert_eq!(p.opacity(1.0).unwrap(), Some(0.0));
        let out = transcript(&p);
        assert!(out.contains("[Error] Invalid numerical input"));
        assert!(out.contains("[Error] Invalid opacity"));
        assert_eq!(out.matches("Enter the watermark opacity").count(), 3);

        assert_eq!(prompter("0\n-1\n7.5\n").scale(5.0).unwrap(), Some(7.5));
        assert_eq!(prompter("-1\n0\n").border(2.0).unwrap(), Some(0.0));
    }

    #[test]
    fn bad_positions_are_asked_again() {
        let mut p = prompter("middle\nTop-Right\n");
        assert_eq!(p.position(Position::BottomRight).unwrap(), Some(Position::TopRight));
        assert!(transcript(&p).contains("Choose from centered, top-left, top-center"));
    }

    #[test]
    fn collect_remembers_every_answer() {
        let dir = images();
        let mut store = MemoryStore::default();
        let mut p = prompter("photo.png\nlogo.png\n0.5\ncentered\n\n0\n");

        let job = p
            .collect(dir.path(), &WatermarkParams::default(), &mut store)
            .unwrap()
            .unwrap();
        assert_eq!(job.original, dir.path().join("photo.png"));
        assert_eq!(job.watermark, dir.path().join("logo.png"));
        assert_eq!(
            job.params,
            WatermarkParams {
                opacity: 0.5,
                position: Position::Centered,
                scale_percentage: 5.0,
                border_percentage: 0.0,
            }
        );

        assert_eq!(
            params::stored_watermark_path(&store).unwrap(),
            Some(dir.path().join("logo.png"))
        );
        assert_eq!(
            WatermarkParams::from_store(&store, &WatermarkParams::default()).unwrap(),
            job.params
        );
    }

    #[test]
    fn quitting_midway_keeps_what_was_answered() {
        let dir = images();
        let mut store = MemoryStore::default();
        let mut p = prompter("photo.png\nlogo.png\n0.8\nq\n");

        assert_eq!(p.collect(dir.path(), &WatermarkParams::default(), &mut store).unwrap(), None);
        assert_eq!(store.get(CATEGORY, params::KEY_OPACITY).unwrap().as_deref(), Some("0.8"));
        assert_eq!(store.get(CATEGORY, params::KEY_POSITION).unwrap(), None);
    }
}
