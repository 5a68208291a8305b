//! Interactive text menu
//!
//! Reads selections from any `BufRead` and writes results to any `Write`;
//! query output is framed by `BEGIN OUTPUT` / `END OUTPUT` lines. Every line
//! the user types goes to the access log.

use crate::access_log::AccessLog;
use crate::config::Sources;
use crate::error::Result;
use crate::processor::DataProcessor;
use crate::types::{is_valid_zip, PropertyMetric, VaccinationKind};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::sync::Arc;

const MENU_TEXT: &str = "Menu:
0. Exit the program.
1. Show the available actions.
2. Show the total population for all ZIP Codes.
3. Show the total vaccinations per capita for each ZIP Code for the specified date.
4. Show the average market value for properties in a specified ZIP Code.
5. Show the average total livable area for properties in a specified ZIP Code.
6. Show the total market value of properties, per capita, for a specified ZIP Code.
7. Show the results of market value per livable square feet.";

/// Menu loop over a processor
pub struct Menu<R, W> {
    processor: DataProcessor,
    available: BTreeSet<i64>,
    log: Arc<dyn AccessLog>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(
        processor: DataProcessor,
        sources: Sources,
        log: Arc<dyn AccessLog>,
        input: R,
        output: W,
    ) -> Self {
        Menu {
            processor,
            available: available_actions(sources),
            log,
            input,
            output,
        }
    }

    /// Actions the current sources allow, ascending
    pub fn available_actions(&self) -> impl Iterator<Item = i64> + '_ {
        self.available.iter().copied()
    }

    /// Run until the user picks 0 or input ends
    pub fn run(&mut self) -> Result<()> {
        writeln!(self.output, "{}", MENU_TEXT)?;

        while let Some(line) = self.prompt()? {
            let selection: i64 = match line.parse() {
                Ok(n) => n,
                Err(_) => {
                    writeln!(
                        self.output,
                        "Invalid input. Please enter a number between 0 and 7."
                    )?;
                    continue;
                }
            };

            if !self.available.contains(&selection) {
                writeln!(self.output, "That action is not currently available.")?;
                continue;
            }

            match selection {
                0 => break,
                1 => self.show_available_actions()?,
                2 => {
                    let total = self.processor.total_population();
                    self.emit_integer(total)?;
                }
                3 => self.vaccinations_per_capita()?,
                4 => self.zip_query(|p, zip| p.average(zip, PropertyMetric::MarketValue))?,
                5 => self.zip_query(|p, zip| p.average(zip, PropertyMetric::LivableArea))?,
                6 => self.zip_query(|p, zip| p.market_value_per_capita(zip))?,
                7 => {
                    writeln!(
                        self.output,
                        "Custom feature: Market value per square foot for a specified ZIP code."
                    )?;
                    self.zip_query(|p, zip| p.market_value_per_sq_ft(zip))?
                }
                _ => writeln!(self.output, "Unknown action.")?,
            }
        }

        self.output.flush()?;
        Ok(())
    }

    /// Print `> `, read one trimmed line and log it; `None` at end of input
    fn prompt(&mut self) -> Result<Option<String>> {
        write!(self.output, "> ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim().to_string();
        self.log.log(&line);
        Ok(Some(line))
    }

    /// Prompt with a question; end of input reads as an empty answer
    fn ask(&mut self, question: &str) -> Result<String> {
        writeln!(self.output, "{}", question)?;
        Ok(self.prompt()?.unwrap_or_default())
    }

    fn show_available_actions(&mut self) -> Result<()> {
        writeln!(self.output, "BEGIN OUTPUT")?;
        for action in &self.available {
            writeln!(self.output, "{}", action)?;
        }
        writeln!(self.output, "END OUTPUT")?;
        Ok(())
    }

    fn vaccinations_per_capita(&mut self) -> Result<()> {
        let answer = self.ask("Enter vaccination type (partial or full):")?;
        let kind: VaccinationKind = match answer.parse() {
            Ok(kind) => kind,
            Err(_) => {
                writeln!(self.output, "Invalid vaccination type.")?;
                return Ok(());
            }
        };

        let answer = self.ask("Enter date (YYYY-MM-DD):")?;
        let date = match parse_menu_date(&answer) {
            Some(date) => date,
            None => {
                writeln!(self.output, "Invalid date format.")?;
                return Ok(());
            }
        };

        let results = self.processor.vaccinations_per_capita(kind, date);
        writeln!(self.output, "BEGIN OUTPUT")?;
        if results.is_empty() {
            writeln!(self.output, "0")?;
        }
        for (zip, value) in &results {
            writeln!(self.output, "{} {:.4}", zip, value)?;
        }
        writeln!(self.output, "END OUTPUT")?;
        Ok(())
    }

    fn zip_query<F>(&mut self, query: F) -> Result<()>
    where
        F: FnOnce(&mut DataProcessor, &str) -> i64,
    {
        let zip = self.ask("Enter a 5-digit ZIP Code:")?;
        if !is_valid_zip(&zip) {
            writeln!(self.output, "Invalid ZIP code. Must be exactly 5 digits.")?;
            return Ok(());
        }
        let result = query(&mut self.processor, &zip);
        self.emit_integer(result)
    }

    fn emit_integer<I: itoa::Integer>(&mut self, value: I) -> Result<()> {
        let mut buffer = itoa::Buffer::new();
        writeln!(self.output, "BEGIN OUTPUT")?;
        writeln!(self.output, "{}", buffer.format(value))?;
        writeln!(self.output, "END OUTPUT")?;
        Ok(())
    }
}

/// Exactly `YYYY-MM-DD`, zero padded
fn parse_menu_date(raw: &str) -> Option<NaiveDate> {
    if raw.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn available_actions(sources: Sources) -> BTreeSet<i64> {
    let mut actions = BTreeSet::from([0, 1]);
    if sources.population {
        actions.insert(2);
    }
    if sources.covid && sources.population {
        actions.insert(3);
    }
    if sources.properties {
        actions.extend([4, 5]);
    }
    if sources.properties && sources.population {
        actions.insert(6);
    }
    if sources.properties && sources.population && sources.covid {
        actions.insert(7);
    }
    actions
}
