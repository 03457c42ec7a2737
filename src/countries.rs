use std::{collections::HashMap, path::Path};

use anyhow::{Context, Result, anyhow};

/// Country display name -> two-letter code.
///
/// Loaded once by the driver and handed by reference to the parsers that key
/// rows by display name.
#[derive(Debug, Clone, Default)]
pub struct CountryCodes {
    codes: HashMap<String, String>,
}

fn lookup_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl CountryCodes {
    pub fn from_pairs<I, N, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, C)>,
        N: AsRef<str>,
        C: AsRef<str>,
    {
        let codes = pairs
            .into_iter()
            .map(|(name, code)| (lookup_key(name.as_ref()), code.as_ref().trim().to_string()))
            .collect();
        Self { codes }
    }

    /// Reads a `name,code` CSV file with a header row.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Opening country code table {path:?}"))?;
        let mut codes = HashMap::new();
        for (line, record) in reader.records().enumerate() {
            let record =
                record.with_context(|| format!("Reading country code table {path:?}"))?;
            let (Some(name), Some(code)) = (record.get(0), record.get(1)) else {
                return Err(anyhow!(
                    "Country code table {path:?} row {} needs a name and a code",
                    line + 2
                ));
            };
            if name.is_empty() || code.is_empty() {
                continue;
            }
            codes.insert(lookup_key(name), code.to_string());
        }
        Ok(Self { codes })
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.codes.get(&lookup_key(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let codes = CountryCodes::from_pairs([("Cote d'Ivoire", "IV"), ("United States", "US")]);
        assert_eq!(codes.lookup("  united   STATES "), Some("US"));
        assert_eq!(codes.lookup("cote d'ivoire"), Some("IV"));
        assert_eq!(codes.lookup("Atlantis"), None);
    }

    #[test]
    fn load_reads_csv_with_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,code\nAfghanistan, AF\n\"Korea, South\",KS\n,XX").unwrap();
        let codes = CountryCodes::load(file.path()).unwrap();
        assert_eq!(codes.len(), 2);
        assert_eq!(codes.lookup("Korea, South"), Some("KS"));
        assert_eq!(codes.lookup("afghanistan"), Some("AF"));
    }
}
