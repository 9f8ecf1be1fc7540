//! The directory of an opened archive.

use std::{cmp::Ordering, str::FromStr};

use derive_more::derive::{Deref, Display, IntoIterator};
use regex::{Regex, RegexBuilder};

use crate::{
    error::{Error, Result},
    resource::Resource,
};

/// Resources in discovery order; only [`ResourceTable::sort_by`] reorders them
#[derive(Debug, Default, Clone, Deref, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct ResourceTable(Vec<Resource>);

impl From<Vec<Resource>> for ResourceTable {
    fn from(resources: Vec<Resource>) -> Self {
        ResourceTable(resources)
    }
}

impl FromIterator<Resource> for ResourceTable {
    fn from_iter<T: IntoIterator<Item = Resource>>(iter: T) -> Self {
        ResourceTable(iter.into_iter().collect())
    }
}

impl Extend<Resource> for ResourceTable {
    fn extend<T: IntoIterator<Item = Resource>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, resource: Resource) {
        self.0.push(resource);
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Resource> {
        self.0.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Resource> {
        self.0.iter_mut()
    }

    /// Remove the resources at `indices`, returning them in table order.
    /// Out of range and repeated indices are ignored.
    pub fn remove(&mut self, indices: &[usize]) -> Vec<Resource> {
        let mut doomed = vec![false; self.0.len()];
        for index in indices {
            if let Some(slot) = doomed.get_mut(*index) {
                *slot = true;
            }
        }

        let (removed, kept) = std::mem::take(&mut self.0)
            .into_iter()
            .zip(doomed)
            .partition::<Vec<_>, _>(|(_, doomed)| *doomed);
        self.0 = kept.into_iter().map(|(r, _)| r).collect();
        removed.into_iter().map(|(r, _)| r).collect()
    }

    /// Swap in a whole new directory, returning the old one
    pub fn replace_all(&mut self, resources: Vec<Resource>) -> Vec<Resource> {
        std::mem::replace(&mut self.0, resources)
    }

    /// Stable sort on `column`; ties fall back to the case-insensitive full name, ascending
    pub fn sort_by(&mut self, column: Column, ascending: bool) {
        self.0.sort_by(|a, b| {
            let primary = column.value(a).cmp(&column.value(b));
            let primary = if ascending { primary } else { primary.reverse() };
            primary.then_with(|| compare_paths(a.name(), b.name()))
        });
    }

    /// Resources matching `filter`, in table order
    pub fn filter<'a>(&'a self, filter: &'a Filter) -> impl Iterator<Item = &'a Resource> + 'a {
        self.0.iter().filter(move |r| filter.matches(r))
    }

    /// Keep only the resources matching `filter`
    pub fn retain(&mut self, filter: &Filter) {
        self.0.retain(|r| filter.matches(r));
    }
}

fn compare_paths(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// What kind of values a column holds, which decides how it is filtered
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
    Boolean,
}

/// A property of a resource that tables can be sorted and filtered on
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Column {
    #[display("name")]
    Name,
    #[display("directory")]
    Directory,
    #[display("filename")]
    Filename,
    #[display("extension")]
    Extension,
    #[display("offset")]
    Offset,
    #[display("compressed_length")]
    CompressedLength,
    #[display("decompressed_length")]
    DecompressedLength,
    #[display("compression")]
    CompressionTag,
    #[display("compressed")]
    Compressed,
    #[display("exported")]
    Exported,
}

/// A column value, text compares case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ColumnValue {
    Text(String),
    Number(u64),
    Boolean(bool),
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Name,
        Column::Directory,
        Column::Filename,
        Column::Extension,
        Column::Offset,
        Column::CompressedLength,
        Column::DecompressedLength,
        Column::CompressionTag,
        Column::Compressed,
        Column::Exported,
    ];

    pub fn kind(self) -> ColumnKind {
        match self {
            Column::Name
            | Column::Directory
            | Column::Filename
            | Column::Extension
            | Column::CompressionTag => ColumnKind::Text,
            Column::Offset | Column::CompressedLength | Column::DecompressedLength => {
                ColumnKind::Number
            }
            Column::Compressed | Column::Exported => ColumnKind::Boolean,
        }
    }

    /// Raw text of a column, for display
    pub fn display_value(self, resource: &Resource) -> String {
        match self {
            Column::Name => resource.name().to_owned(),
            Column::Directory => resource.directory().to_owned(),
            Column::Filename => resource.filename().to_owned(),
            Column::Extension => resource.extension().to_owned(),
            Column::Offset => resource.offset().to_string(),
            Column::CompressedLength => resource.compressed_length().to_string(),
            Column::DecompressedLength => resource.decompressed_length().to_string(),
            Column::CompressionTag => resource.compression_tag().to_owned(),
            Column::Compressed => resource.is_compressed().to_string(),
            Column::Exported => resource.is_exported().to_string(),
        }
    }

    /// Comparable value of a column
    pub fn value(self, resource: &Resource) -> ColumnValue {
        match self {
            Column::Offset => ColumnValue::Number(resource.offset()),
            Column::CompressedLength => ColumnValue::Number(resource.compressed_length()),
            Column::DecompressedLength => ColumnValue::Number(resource.decompressed_length()),
            Column::Compressed => ColumnValue::Boolean(resource.is_compressed()),
            Column::Exported => ColumnValue::Boolean(resource.is_exported()),
            text => ColumnValue::Text(text.display_value(resource).to_lowercase()),
        }
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace(['-', ' '], "_");
        match wanted.as_str() {
            "path" => return Ok(Column::Name),
            "dir" => return Ok(Column::Directory),
            "ext" => return Ok(Column::Extension),
            "tag" | "compression_tag" => return Ok(Column::CompressionTag),
            "length" | "size" => return Ok(Column::DecompressedLength),
            _ => {}
        }

        Column::ALL
            .into_iter()
            .find(|c| c.to_string() == wanted)
            .ok_or_else(|| Error::InvalidFilter(format!("unknown column `{s}`")))
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Substring(String),
    Wildcard(Regex),
    Number(u64),
    Boolean(bool),
}

/// A search on one column.
///
/// Text columns match a case-insensitive substring, or the whole value when the
/// pattern contains `*` or `?` wildcards. Number and boolean columns match on equality.
#[derive(Debug, Clone)]
pub struct Filter {
    column: Column,
    matcher: Matcher,
}

impl Filter {
    pub fn new(column: Column, pattern: &str) -> Result<Self> {
        let matcher = match column.kind() {
            ColumnKind::Text if pattern.contains(['*', '?']) => {
                Matcher::Wildcard(wildcard_regex(pattern)?)
            }
            ColumnKind::Text => Matcher::Substring(pattern.to_lowercase()),
            ColumnKind::Number => Matcher::Number(pattern.trim().parse().map_err(|_| {
                Error::InvalidFilter(format!("`{pattern}` is not a number for column {column}"))
            })?),
            ColumnKind::Boolean => Matcher::Boolean(parse_bool(pattern).ok_or_else(|| {
                Error::InvalidFilter(format!("`{pattern}` is not a boolean for column {column}"))
            })?),
        };
        Ok(Filter { column, matcher })
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        match (&self.matcher, self.column.value(resource)) {
            (Matcher::Substring(needle), ColumnValue::Text(value)) => value.contains(needle),
            (Matcher::Wildcard(regex), ColumnValue::Text(value)) => regex.is_match(&value),
            (Matcher::Number(wanted), ColumnValue::Number(value)) => *wanted == value,
            (Matcher::Boolean(wanted), ColumnValue::Boolean(value)) => *wanted == value,
            _ => false,
        }
    }
}

/// `column=pattern`, or just `pattern` to search names
impl FromStr for Filter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((column, pattern)) => Filter::new(column.parse()?, pattern),
            None => Filter::new(Column::Name, s),
        }
    }
}

fn wildcard_regex(pattern: &str) -> Result<Regex> {
    let mut expression = String::from("^");
    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            '*' | '?' => {
                expression.push_str(&regex::escape(&literal));
                literal.clear();
                expression.push_str(if c == '*' { ".*" } else { "." });
            }
            _ => literal.push(c),
        }
    }
    expression.push_str(&regex::escape(&literal));
    expression.push('$');

    Ok(RegexBuilder::new(&expression)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()?)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}
