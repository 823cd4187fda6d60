//! Numbered-menu front end over a [`Catalog`].
//!
//! Reads one answer per line from any [`BufRead`] and writes prompts and results to any
//! [`Write`], so the same loop serves the terminal and scripted tests. Catalog errors are
//! printed and the loop carries on; end of input ends the session.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use log::debug;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::record::{Town, TownUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Insert,
    FindAndUpdate,
    ListAlphabetical,
    ListByPopulation,
    ListByMunicipality,
    Delete,
    Save,
    PrintHashTable,
    HashStats,
    SearchWithCollisions,
    DeleteAndRewrite,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 12] = [
        MenuChoice::Insert,
        MenuChoice::FindAndUpdate,
        MenuChoice::ListAlphabetical,
        MenuChoice::ListByPopulation,
        MenuChoice::ListByMunicipality,
        MenuChoice::Delete,
        MenuChoice::Save,
        MenuChoice::PrintHashTable,
        MenuChoice::HashStats,
        MenuChoice::SearchWithCollisions,
        MenuChoice::DeleteAndRewrite,
        MenuChoice::Exit,
    ];

    /// Menu number, starting at 1.
    pub fn number(self) -> usize {
        Self::ALL.iter().position(|&c| c == self).map_or(0, |i| i + 1)
    }

    pub fn from_number(n: usize) -> Option<Self> {
        n.checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    fn label(self) -> &'static str {
        match self {
            MenuChoice::Insert => "Insert a new town",
            MenuChoice::FindAndUpdate => "Find and update a town",
            MenuChoice::ListAlphabetical => "List towns in alphabetical order",
            MenuChoice::ListByPopulation => "List towns with population greater than a given number",
            MenuChoice::ListByMunicipality => "List towns based on municipality status",
            MenuChoice::Delete => "Delete a town",
            MenuChoice::Save => "Save to file",
            MenuChoice::PrintHashTable => "Print hash table (including empty spots)",
            MenuChoice::HashStats => "Print hash table stats",
            MenuChoice::SearchWithCollisions => "Search for a town and print collisions",
            MenuChoice::DeleteAndRewrite => "Delete a town and rewrite the save file",
            MenuChoice::Exit => "Exit",
        }
    }
}

pub struct Shell<'a, R, W> {
    catalog: &'a mut Catalog,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Shell<'a, R, W> {
    pub fn new(catalog: &'a mut Catalog, input: R, output: W) -> Self {
        Self {
            catalog,
            input,
            output,
        }
    }

    /// Run the menu until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(answer) = self.prompt("Enter your choice: ")? else {
                return Ok(());
            };

            let choice = answer.parse().ok().and_then(MenuChoice::from_number);
            match choice {
                Some(MenuChoice::Exit) => {
                    writeln!(self.output, "Exiting...")?;
                    return Ok(());
                }
                Some(choice) => {
                    debug!("menu choice {choice:?}");
                    self.dispatch(choice)?;
                }
                None => writeln!(self.output, "Invalid choice. Please try again.")?,
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Main Menu")?;
        for choice in MenuChoice::ALL {
            writeln!(self.output, "{}. {}", choice.number(), choice.label())?;
        }
        Ok(())
    }

    fn dispatch(&mut self, choice: MenuChoice) -> io::Result<()> {
        match choice {
            MenuChoice::Insert => self.insert(),
            MenuChoice::FindAndUpdate => self.find_and_update(),
            MenuChoice::ListAlphabetical => {
                writeln!(self.output, "Towns in alphabetical order:")?;
                let catalog = &*self.catalog;
                write_towns(&mut self.output, catalog.iter())
            }
            MenuChoice::ListByPopulation => {
                let Some(threshold) = self.prompt_parse::<u32>("Enter population filter: ")? else {
                    return Ok(());
                };
                writeln!(self.output, "Towns with population greater than {threshold}:")?;
                let catalog = &*self.catalog;
                write_towns(&mut self.output, catalog.above_population(threshold))
            }
            MenuChoice::ListByMunicipality => {
                let Some(flag) = self.prompt("Enter municipality filter (yes/no): ")? else {
                    return Ok(());
                };
                writeln!(self.output, "Towns with municipality status '{flag}':")?;
                let catalog = &*self.catalog;
                write_towns(&mut self.output, catalog.with_municipality(&flag))
            }
            MenuChoice::Delete => {
                let Some(town) = self.prompt("Enter town to delete: ")? else {
                    return Ok(());
                };
                let result = self.catalog.remove(&town).map(|_| "Town deleted successfully!");
                self.report(result)
            }
            MenuChoice::Save => {
                let result = self
                    .catalog
                    .save()
                    .map(|()| format!("Data saved to {} successfully!", self.catalog.save_path().display()));
                self.report(result)
            }
            MenuChoice::PrintHashTable => {
                writeln!(self.output, "Hashed Table:")?;
                write!(self.output, "{}", self.catalog.hashed())
            }
            MenuChoice::HashStats => {
                let stats = self.catalog.hash_stats();
                writeln!(self.output, "{stats}")
            }
            MenuChoice::SearchWithCollisions => {
                let Some(town) = self.prompt("Enter town to search: ")? else {
                    return Ok(());
                };
                let result = self.catalog.lookup(&town).map(|found| {
                    format!(
                        "Town found: {}\nNumber of collisions: {}",
                        found.town.town, found.probe.collisions
                    )
                });
                self.report(result)
            }
            MenuChoice::DeleteAndRewrite => {
                let Some(town) = self.prompt("Enter town to delete: ")? else {
                    return Ok(());
                };
                let result = self.catalog.remove_and_save(&town).map(|_| {
                    format!(
                        "Town deleted and {} updated successfully!",
                        self.catalog.save_path().display()
                    )
                });
                self.report(result)
            }
            MenuChoice::Exit => Ok(()),
        }
    }

    fn insert(&mut self) -> io::Result<()> {
        let Some(district) = self.prompt("Enter district: ")? else {
            return Ok(());
        };
        let Some(name) = self.prompt("Enter town: ")? else {
            return Ok(());
        };
        let Some(population) = self.prompt_parse::<u32>("Enter population: ")? else {
            return Ok(());
        };
        let Some(elevation) = self.prompt_parse::<i32>("Enter elevation: ")? else {
            return Ok(());
        };
        let Some(municipality) = self.prompt("Has municipality (yes/no): ")? else {
            return Ok(());
        };

        let town = Town::new(district, name, population, elevation, municipality);
        let result = self.catalog.insert(town).map(|_| "Town added successfully!");
        self.report(result)
    }

    fn find_and_update(&mut self) -> io::Result<()> {
        let Some(name) = self.prompt("Enter town to find: ")? else {
            return Ok(());
        };
        let found = match self.catalog.find(&name) {
            Ok(town) => town.to_string(),
            Err(err) => return self.report::<&str>(Err(err)),
        };
        writeln!(self.output, "Town found: {found}")?;

        let Some(population) = self.prompt_parse::<u32>("Enter new population: ")? else {
            return Ok(());
        };
        let Some(elevation) = self.prompt_parse::<i32>("Enter new elevation: ")? else {
            return Ok(());
        };
        let Some(municipality) = self.prompt("Has municipality (yes/no): ")? else {
            return Ok(());
        };

        let update = TownUpdate {
            population,
            elevation,
            municipality,
        };
        let result = self
            .catalog
            .update(&name, update)
            .map(|_| "Town updated successfully!");
        self.report(result)
    }

    /// Print `label` and read one trimmed line; `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Prompt until the answer parses as `T`; `None` at end of input.
    fn prompt_parse<T: FromStr>(&mut self, label: &str) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.prompt(label)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "Invalid number: {answer:?}")?,
            }
        }
    }

    fn report<M: Display>(&mut self, result: Result<M>) -> io::Result<()> {
        match result {
            Ok(message) => writeln!(self.output, "{message}"),
            Err(err) => writeln!(self.output, "Error: {err}"),
        }
    }
}

fn write_towns<'t, W: Write>(out: &mut W, towns: impl Iterator<Item = &'t Town>) -> io::Result<()> {
    for town in towns {
        writeln!(out, "{town}")?;
    }
    Ok(())
}
