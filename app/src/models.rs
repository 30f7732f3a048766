// ==============================================================================
// models.rs - Variant Join Data Models
// ==============================================================================
// Description: Join key, output header and shared constants
// Author: Matt Barham
// Created: 2026-10-18
// Modified: 2026-10-18
// Version: 1.0.0
// ==============================================================================

/// Token written for every value a source could not supply
pub const MISSING_VALUE: &str = ".";

/// Leading output columns, in the same order as the join key
pub const BASE_COLUMNS: [&str; 4] = ["chromosome", "position", "ref", "alt"];

/// Normalize a chromosome name: uppercase and drop a leading "CHR"
///
/// `chr1`, `CHR1` and `1` all become `1`; `chrX` becomes `X`.
pub fn normalize_chromosome(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match upper.strip_prefix("CHR") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

/// Exact-match join key shared by every annotation source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariantKey {
    /// Normalized chromosome (e.g., "1", "X", "MT")
    pub chromosome: String,
    /// Position, compared as text
    pub position: String,
    /// Reference allele
    pub ref_allele: String,
    /// Alternate allele
    pub alt_allele: String,
}

impl VariantKey {
    /// Build a key, normalizing the chromosome
    pub fn new(chromosome: &str, position: &str, ref_allele: &str, alt_allele: &str) -> Self {
        Self {
            chromosome: normalize_chromosome(chromosome),
            position: position.trim().to_string(),
            ref_allele: ref_allele.trim().to_string(),
            alt_allele: alt_allele.trim().to_string(),
        }
    }

    /// Initial output fields for a record carrying this key
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.chromosome.clone(),
            self.position.clone(),
            self.ref_allele.clone(),
            self.alt_allele.clone(),
        ]
    }
}

/// Output header, grown in lockstep with the record fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

impl Header {
    /// Header holding only the base variant columns
    pub fn new() -> Self {
        Self {
            columns: BASE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn push(&mut self, column: impl Into<String>) {
        self.columns.push(column.into());
    }

    pub fn extend<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns.extend(columns.into_iter().map(Into::into));
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_chromosome() {
        assert_eq!(normalize_chromosome("chr1"), "1");
        assert_eq!(normalize_chromosome("CHR1"), "1");
        assert_eq!(normalize_chromosome("Chr22"), "22");
        assert_eq!(normalize_chromosome("1"), "1");
        assert_eq!(normalize_chromosome("chrx"), "X");
        assert_eq!(normalize_chromosome("MT"), "MT");
    }

    #[test]
    fn test_key_equality_after_normalization() {
        let a = VariantKey::new("chr1", "100", "A", "T");
        let b = VariantKey::new("CHR1", "100", "A", "T");
        let c = VariantKey::new("1", "100", "T", "A");
        assert_eq!(a, b);
        assert_ne!(a, c); // ref/alt order matters
    }

    #[test]
    fn test_record_follows_key_order() {
        let key = VariantKey::new("chr2", "5000", "G", "C");
        assert_eq!(key.to_record(), vec!["2", "5000", "G", "C"]);
    }

    #[test]
    fn test_header_starts_with_base_columns() {
        let mut header = Header::new();
        assert_eq!(header.columns(), &["chromosome", "position", "ref", "alt"]);

        header.push("dbSNP");
        header.extend(["1000G_ALL_Ref", "1000G_ALL_Alt"]);
        assert_eq!(header.len(), 7);
        assert_eq!(header.columns()[6], "1000G_ALL_Alt");
    }
}
