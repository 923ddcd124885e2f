use crate::aggregator::ProviderFailure;
use crate::record::LiteraryRecord;
use colored::Colorize;

/// Print a numbered listing of records to stdout with colors
pub fn print_results(heading: &str, records: &[LiteraryRecord]) {
    println!();
    println!("{}", heading.bold());
    println!("{}", "=".repeat(50));

    if records.is_empty() {
        println!("{}", "No books found.".dimmed());
        return;
    }

    for (i, record) in records.iter().enumerate() {
        print_record(i + 1, record);
    }
    println!();
}

/// Print catalogs that did not contribute to a search
pub fn print_failures(failures: &[ProviderFailure]) {
    if failures.is_empty() {
        return;
    }

    println!(
        "{}",
        format!("CATALOG WARNINGS ({})", failures.len()).yellow().bold()
    );
    for failure in failures {
        println!("  {} {}", "!".yellow(), failure.error);
    }
    println!();
}

fn print_record(number: usize, record: &LiteraryRecord) {
    let title = if record.title.is_empty() {
        "(untitled)".to_string()
    } else {
        record.title.clone()
    };

    println!("{:>3}. {}", number, title.cyan().bold());
    if let Some(line) = byline(record) {
        println!("     {}", line);
    }
    if !record.detail_url.is_empty() {
        println!("     {}", record.detail_url.dimmed());
    }
}

/// "Author, Author (year)" or None when both are missing
fn byline(record: &LiteraryRecord) -> Option<String> {
    let authors = record.authors.join(", ");
    match (authors.is_empty(), record.year.is_empty()) {
        (true, true) => None,
        (false, true) => Some(authors),
        (true, false) => Some(format!("({})", record.year)),
        (false, false) => Some(format!("{} ({})", authors, record.year)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byline_combines_authors_and_year() {
        let mut record = LiteraryRecord::new("1", "Solaris");
        assert_eq!(byline(&record), None);

        record.year = "1961".to_string();
        assert_eq!(byline(&record).as_deref(), Some("(1961)"));

        record.authors = vec!["Stanisław Lem".to_string(), "Joanna Kilmartin".to_string()];
        assert_eq!(
            byline(&record).as_deref(),
            Some("Stanisław Lem, Joanna Kilmartin (1961)")
        );
    }
}
