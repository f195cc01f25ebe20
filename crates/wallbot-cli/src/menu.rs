//! Interactive operator menu

use anyhow::Context;
use std::io::{self, BufRead, Write};

use wallbot_core::dispatch::DispatchError;
use wallbot_core::input::{parse_repetitions, InputError, Workspace};
use wallbot_core::protocol::Transport;
use wallbot_core::sequence::SequenceError;
use wallbot_core::session::Session;

use crate::interrupt::Interrupt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Menu<'a, T: Transport, R, W> {
    session: &'a mut Session<T>,
    interrupt: Interrupt,
    input: R,
    out: W,
}

impl<'a, T, R, W> Menu<'a, T, R, W>
where
    T: Transport,
    R: BufRead,
    W: Write,
{
    pub fn new(session: &'a mut Session<T>, interrupt: Interrupt, input: R, out: W) -> Self {
        Self {
            session,
            interrupt,
            input,
            out,
        }
    }

    /// Run until stdin is closed or a fatal error occurs
    pub fn run(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "\n---Welcome!---")?;
        writeln!(
            self.out,
            "Send commands in quick succession by reading them from a CSV file,"
        )?;
        writeln!(self.out, "or write a CSV file with 2 alternating commands.")?;
        writeln!(self.out, "Quit with Ctrl+C.")?;
        writeln!(self.out, "(S)end commands")?;
        writeln!(self.out, "(W)rite file")?;

        loop {
            let Some(selection) = self.prompt("Select action: (s, w)")? else {
                return Ok(());
            };
            let flow = match selection.trim().to_lowercase().as_str() {
                "s" => self.send()?,
                "w" => self.write()?,
                _ => {
                    writeln!(self.out, "Invalid input!")?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                return Ok(());
            }
        }
    }

    fn send(&mut self) -> anyhow::Result<Flow> {
        let files = self
            .session
            .store()
            .list()
            .context("failed to list command files")?;
        writeln!(self.out, "Available csv files:")?;
        for file in &files {
            writeln!(self.out, "{file}")?;
        }

        let Some(name) = self.prompt("Select the desired file by typing its name:")? else {
            return Ok(Flow::Quit);
        };

        let result = {
            let _busy = self.interrupt.busy();
            self.session.send_file(name.trim())
        };

        match result {
            Ok(report) => {
                writeln!(self.out, "DONE")?;
                writeln!(
                    self.out,
                    "Time elapsed for move in seconds: {:.3}",
                    report.elapsed.as_secs_f64()
                )?;
            }
            Err(DispatchError::Sequence(SequenceError::NotFound(_))) => {
                writeln!(self.out, "Incorrect file name! Try again!")?;
            }
            Err(DispatchError::Sequence(SequenceError::Empty)) => {
                writeln!(self.out, "File to be sent must not be empty!")?;
            }
            Err(e) if e.is_recoverable() => writeln!(self.out, "{e}")?,
            Err(e) => return Err(e).context("lost connection to the robot"),
        }
        Ok(Flow::Continue)
    }

    fn write(&mut self) -> anyhow::Result<Flow> {
        let Some(workspace) =
            self.prompt_valid("Give distance between motors in mm:", Workspace::parse)?
        else {
            return Ok(Flow::Quit);
        };

        let half = workspace.half_span();
        writeln!(self.out, "Choose commands to be written")?;
        let mut coords = [0i32; 4];
        let labels = [
            "start coordinate x0",
            "start coordinate y0",
            "target coordinate x1",
            "target coordinate y1",
        ];
        for (slot, label) in coords.iter_mut().zip(labels) {
            let text = format!("Give {label} between {} and {half}", -half);
            let Some(value) = self.prompt_valid(&text, |s| workspace.parse_coordinate(s))? else {
                return Ok(Flow::Quit);
            };
            *slot = value;
        }
        let Some(reps) =
            self.prompt_valid("Give amount of repetitions between 1 and 100", parse_repetitions)?
        else {
            return Ok(Flow::Quit);
        };

        let [x0, y0, x1, y1] = coords;
        match self
            .session
            .write_alternating(&workspace, (x0, y0), (x1, y1), reps)
        {
            Ok(path) => writeln!(self.out, "Saved file {}", path.display())?,
            Err(e) => writeln!(self.out, "Could not save file: {e}")?,
        }
        Ok(Flow::Continue)
    }

    /// Print `text` and read one line; `None` once input is exhausted
    fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        write!(self.out, "{text} ")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Prompt until `parse` accepts the answer
    fn prompt_valid<V, F>(&mut self, text: &str, parse: F) -> io::Result<Option<V>>
    where
        F: Fn(&str) -> Result<V, InputError>,
    {
        loop {
            let Some(line) = self.prompt(text)? else {
                return Ok(None);
            };
            match parse(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => writeln!(self.out, "{e}")?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::fs;
    use std::io::Cursor;
    use wallbot_core::config::SessionConfig;
    use wallbot_core::protocol::{CancelToken, ProtocolError};

    #[derive(Default)]
    struct AckingTransport {
        frames: Vec<Vec<u8>>,
        replies: VecDeque<String>,
        unplugged: bool,
    }

    impl Transport for AckingTransport {
        fn write_frame(&mut self, frame: &[u8]) -> Result<(), ProtocolError> {
            if self.unplugged {
                return Err(ProtocolError::Disconnected);
            }
            self.frames.push(frame.to_vec());
            self.replies.push_back("DONE".to_string());
            Ok(())
        }

        fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
            Ok(self.replies.pop_front())
        }
    }

    fn session(dir: &std::path::Path, transport: AckingTransport) -> Session<AckingTransport> {
        let config = SessionConfig {
            ack_timeout_ms: Some(200),
            commands_dir: dir.to_path_buf(),
            ..Default::default()
        };
        Session::with_transport(transport, config, CancelToken::new())
    }

    fn run(session: &mut Session<AckingTransport>, input: &str) -> (anyhow::Result<()>, String) {
        let mut out = Vec::new();
        let interrupt = Interrupt::new(session.cancel_token().clone());
        let result = Menu::new(session, interrupt, Cursor::new(input), &mut out).run();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_write_then_send() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), AckingTransport::default());

        let (result, out) = run(&mut s, "w\n200\n-50\n0\n50\n0\n2\ns\ncommands1.csv\n");
        result.unwrap();
        assert!(out.contains("Saved file"));
        assert!(out.contains("commands1.csv"));
        assert!(out.contains("Time elapsed for move in seconds"));
        assert_eq!(
            fs::read_to_string(dir.path().join("commands1.csv")).unwrap(),
            "<MOVE, 50, 0>\n<MOVE, -50, 0>\n<MOVE, 50, 0>\n<MOVE, -50, 0>\n"
        );
        assert_eq!(s.into_transport().frames.len(), 4);
    }

    #[test]
    fn test_reprompts_on_invalid_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), AckingTransport::default());

        let (result, out) = run(&mut s, "w\nwide\n100\n51\n50\n0\n0\n0\n0\n1\n");
        result.unwrap();
        assert!(out.contains("Integers please!"));
        assert!(out.contains("Value has to be between -50 and 50, got 51"));
        assert!(dir.path().join("commands1.csv").is_file());
    }

    #[test]
    fn test_unknown_selection_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path(), AckingTransport::default());

        let (result, out) = run(&mut s, "x\ns\nnope.csv\n");
        result.unwrap();
        assert!(out.contains("Invalid input!"));
        assert!(out.contains("Incorrect file name! Try again!"));
    }

    #[test]
    fn test_empty_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.csv"), "").unwrap();
        let mut s = session(dir.path(), AckingTransport::default());

        let (result, out) = run(&mut s, "s\nempty.csv\n");
        result.unwrap();
        assert!(out.contains("empty.csv\n"));
        assert!(out.contains("File to be sent must not be empty!"));
    }

    #[test]
    fn test_transport_failure_ends_menu() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("commands1.csv"), "<MOVE, 1, 1>\n").unwrap();
        let transport = AckingTransport {
            unplugged: true,
            ..Default::default()
        };
        let mut s = session(dir.path(), transport);

        let (result, _) = run(&mut s, "s\ncommands1.csv\nw\n");
        assert!(result.is_err());
    }
}
