use crate::CompanySummary;

pub const CSV_FILE_NAME: &str = "companies_to_apply.csv";
const CSV_HEADERS: [&str; 2] = ["Applied?", "Company Name"];

/// Application shortlist: a blank `Applied?` column next to each name.
/// Data cells are always quoted; the header row is not.
pub fn shortlist_csv(companies: &[CompanySummary]) -> String {
    let mut lines = Vec::with_capacity(companies.len() + 1);
    lines.push(CSV_HEADERS.join(","));

    for company in companies {
        lines.push(format!("{},{}", quote_cell(""), quote_cell(&company.name)));
    }

    lines.join("\n")
}

fn quote_cell(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
