//! Disambiguation collaborators.
//!
//! The resolver never reads input itself; it asks a [`Disambiguator`] to pick
//! a country and, when that country has several results, a specific place.
//! [`TerminalPrompt`] asks a human on a terminal, [`PresetChoices`] replays
//! answers submitted ahead of time (CLI flags, a web form).

use serde::Serialize;
use std::io::{self, BufRead, Write};

use super::types::{Candidate, CountryOption};

/// An answer from a disambiguator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Selected(T),
    Cancel,
}

pub trait Disambiguator {
    /// Pick one of `options` by country name.
    fn choose_country(&mut self, options: &[CountryOption]) -> Choice<String>;

    /// Pick one of `candidates` by zero-based index.
    fn choose_candidate(&mut self, candidates: &[Candidate]) -> Choice<usize>;
}

// ─── Terminal ───────────────────────────────────────────────────

/// Numbered-table prompt over any line reader and writer.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stdin, rendering to stderr so stdout stays machine-readable.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read numbers until one is in `min..=max`. `None` on end of input.
    fn read_number(&mut self, min: usize, max: usize) -> io::Result<Option<usize>> {
        loop {
            write!(self.output, "\nEnter choice number: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            match line.trim().parse::<usize>() {
                Ok(n) if (min..=max).contains(&n) => return Ok(Some(n)),
                Ok(_) => writeln!(self.output, "Invalid choice. Please try again.")?,
                Err(_) => writeln!(self.output, "Please enter a valid number.")?,
            }
        }
    }

    fn ask_country(&mut self, options: &[CountryOption]) -> io::Result<Choice<String>> {
        writeln!(self.output, "\nMultiple locations found. Please select a country:")?;
        let mut rows: Vec<[String; 3]> = options
            .iter()
            .enumerate()
            .map(|(i, o)| [(i + 1).to_string(), o.country.clone(), o.example.clone()])
            .collect();
        rows.push(["0".into(), "None of these".into(), "Try a different search".into()]);
        render_table(&mut self.output, ["#", "Country", "Display Name"], &rows)?;

        Ok(match self.read_number(0, options.len())? {
            Some(n) if n > 0 => Choice::Selected(options[n - 1].country.clone()),
            _ => Choice::Cancel,
        })
    }

    fn ask_candidate(&mut self, candidates: &[Candidate]) -> io::Result<Choice<usize>> {
        writeln!(self.output, "\nMultiple specific locations found. Please select one:")?;
        let rows: Vec<[String; 3]> = candidates
            .iter()
            .enumerate()
            .map(|(i, c)| [(i + 1).to_string(), c.display_name.clone(), c.place_type.clone()])
            .collect();
        render_table(&mut self.output, ["#", "Location", "Type"], &rows)?;

        Ok(match self.read_number(1, candidates.len())? {
            Some(n) => Choice::Selected(n - 1),
            None => Choice::Cancel,
        })
    }
}

impl<R: BufRead, W: Write> Disambiguator for TerminalPrompt<R, W> {
    fn choose_country(&mut self, options: &[CountryOption]) -> Choice<String> {
        self.ask_country(options).unwrap_or(Choice::Cancel)
    }

    fn choose_candidate(&mut self, candidates: &[Candidate]) -> Choice<usize> {
        self.ask_candidate(candidates).unwrap_or(Choice::Cancel)
    }
}

fn render_table<W: Write>(out: &mut W, headers: [&str; 3], rows: &[[String; 3]]) -> io::Result<()> {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let line = |cells: [&str; 3]| {
        format!(
            "  {:<w0$}  {:<w1$}  {}",
            cells[0],
            cells[1],
            cells[2],
            w0 = widths[0],
            w1 = widths[1],
        )
    };
    writeln!(out, "{}", line(headers).trim_end())?;
    for row in rows {
        writeln!(out, "{}", line([row[0].as_str(), row[1].as_str(), row[2].as_str()]).trim_end())?;
    }
    Ok(())
}

// ─── Preset answers ─────────────────────────────────────────────

/// The question a [`PresetChoices`] could not answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", content = "options", rename_all = "snake_case")]
pub enum Pending {
    Country(Vec<CountryOption>),
    Candidate(Vec<Candidate>),
}

/// Answers supplied up front.
///
/// A question without a preset answer is cancelled and remembered as
/// [`Pending`], so a caller can show the options and resubmit with an answer.
#[derive(Debug, Clone, Default)]
pub struct PresetChoices {
    country: Option<String>,
    /// One-based, as numbered in the rendered options.
    pick: Option<usize>,
    pending: Option<Pending>,
}

impl PresetChoices {
    pub fn new(country: Option<String>, pick: Option<usize>) -> Self {
        Self {
            country: country.filter(|c| !c.trim().is_empty()),
            pick,
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    pub fn into_pending(self) -> Option<Pending> {
        self.pending
    }
}

impl Disambiguator for PresetChoices {
    fn choose_country(&mut self, options: &[CountryOption]) -> Choice<String> {
        match &self.country {
            Some(wanted) => {
                let wanted = wanted.trim();
                let matched = options
                    .iter()
                    .find(|o| o.country.eq_ignore_ascii_case(wanted))
                    .map(|o| o.country.clone());
                Choice::Selected(matched.unwrap_or_else(|| wanted.to_string()))
            }
            None => {
                self.pending = Some(Pending::Country(options.to_vec()));
                Choice::Cancel
            }
        }
    }

    fn choose_candidate(&mut self, candidates: &[Candidate]) -> Choice<usize> {
        match self.pick {
            Some(0) => Choice::Cancel,
            Some(n) => Choice::Selected(n - 1),
            None => {
                self.pending = Some(Pending::Candidate(candidates.to_vec()));
                Choice::Cancel
            }
        }
    }
}

/// Preset answers where given; every other question goes to `fallback`.
pub struct PresetThenAsk<D> {
    preset: PresetChoices,
    fallback: D,
}

impl<D: Disambiguator> PresetThenAsk<D> {
    pub fn new(preset: PresetChoices, fallback: D) -> Self {
        Self { preset, fallback }
    }
}

impl<D: Disambiguator> Disambiguator for PresetThenAsk<D> {
    fn choose_country(&mut self, options: &[CountryOption]) -> Choice<String> {
        if self.preset.country.is_some() {
            self.preset.choose_country(options)
        } else {
            self.fallback.choose_country(options)
        }
    }

    fn choose_candidate(&mut self, candidates: &[Candidate]) -> Choice<usize> {
        if self.preset.pick.is_some() {
            self.preset.choose_candidate(candidates)
        } else {
            self.fallback.choose_candidate(candidates)
        }
    }
}
