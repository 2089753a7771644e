use crate::error::HashJobError;
use crate::speed::get_speed;
use crate::HashProgress;
use num_format::{Locale, ToFormattedString};
use std::io::{stdout, Write};
use std::time::Instant;
use terminal_size::{terminal_size, Width};
use unicode_segmentation::UnicodeSegmentation;

const OUTPUT_REFRESH_IN_MILLIS: u128 = 233;
const DEFAULT_OUTPUT_WIDTH: usize = 80;

/// Renders one job on a single, repeatedly overwritten terminal line.
pub struct Output {
    output_width: usize,
    last_output_instant: Option<Instant>,
    last_bytes_processed: u64,
}

impl Output {
    pub fn new() -> Self {
        let output_width = terminal_size()
            .map(|(Width(width), _)| width as usize)
            .unwrap_or(DEFAULT_OUTPUT_WIDTH);
        Output {
            output_width: output_width.saturating_sub(1),
            last_output_instant: None,
            last_bytes_processed: 0,
        }
    }
    fn pad_line(&self, line: String) -> String {
        let line_len = line.graphemes(true).count();
        if line_len < self.output_width {
            let pad = " ".repeat(self.output_width - line_len);
            return line + &pad;
        }

        line
    }
    fn fit_file_path(&self, file_path: &str, info: &str) -> String {
        let file_path_max_size = self.output_width.saturating_sub(info.len());
        let mut file_path_graphemes = file_path.graphemes(true);
        let file_path_len = file_path_graphemes.clone().count();
        if file_path_max_size >= file_path_len {
            return file_path.to_owned();
        }

        let offset = file_path_len - file_path_max_size + "..".len();
        for _ in 0..offset {
            file_path_graphemes.next();
        }

        format!("..{}", file_path_graphemes.as_str())
    }
    fn write_line(&mut self, line: String, new_line: bool, error: bool) {
        let line_output = self.pad_line(line);
        if error {
            eprintln!(" {}\r", line_output);
        } else if new_line {
            println!(" {}\r", line_output);
        } else {
            print!(" {}\r", line_output);
        }

        let _ = stdout().flush();
        self.last_output_instant = Some(Instant::now());
    }
    pub fn write_init(&mut self) {
        print!(" Opening file...\r");
        let _ = stdout().flush();
        self.last_output_instant = Some(Instant::now());
    }
    pub fn write_progress(&mut self, file_path: &str, progress: &HashProgress) {
        let now = Instant::now();
        let elapsed_millis = match self.last_output_instant {
            Some(instant) => now.duration_since(instant).as_millis(),
            _ => 0,
        };
        let complete = progress.percent() >= 100.0;
        if !complete && elapsed_millis <= OUTPUT_REFRESH_IN_MILLIS {
            return;
        }

        let speed = get_speed(
            progress.bytes_processed,
            self.last_bytes_processed,
            elapsed_millis,
        );
        let info = format!(
            " ({}; {:.1} %; {} {})",
            progress.file_size.to_formatted_string(&Locale::en),
            progress.percent(),
            speed.bytes_per_second.to_formatted_string(&Locale::en),
            speed.unit
        );
        let line = format!("{}{}", self.fit_file_path(file_path, &info), info);
        self.write_line(line, false, false);
        self.last_bytes_processed = progress.bytes_processed;
    }
    pub fn write_error(&mut self, file_path: &str, error: &HashJobError) {
        let info = format!(" => {}", error);
        let line = format!("{}{}", self.fit_file_path(file_path, &info), info);
        self.write_line(line, true, true);
    }
    pub fn write_result(&self, result: String) {
        println!("{}\r", self.pad_line(result));
    }
    pub fn clear_line(&self) {
        print!("{}\r", self.pad_line("".into()));
        let _ = stdout().flush();
    }
}
