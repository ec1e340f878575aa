//! Heuristic field extraction over OCR line output.
//!
//! A bounded, stateless, single-pass classifier: given detected lines with
//! confidence scores, assign name, job title, company, email, phone, website
//! and address. Lines below the confidence threshold are discarded before any
//! heuristic runs and never appear in the retained raw text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ocr::OcrLine;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d{1,4}\)?[-.\s]?\(?\d{1,4}\)?(?:[-.\s]?\d{2,4}){1,4}").unwrap()
});

static WEBSITE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:https?://[^\s]+|www\.[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+|[A-Za-z0-9-]+\.(?:com|org|net|io|co|dev|ai|app)\b[^\s]*)",
    )
    .unwrap()
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z][a-zA-Z'\-]+(?:\s+[A-Z][a-zA-Z'.\-]*){1,3}$").unwrap()
});

static ZIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap());

/// Vocabulary of job-title keywords matched case-insensitively.
const TITLE_KEYWORDS: &[&str] = &[
    "engineer",
    "developer",
    "manager",
    "director",
    "president",
    "ceo",
    "cto",
    "cfo",
    "coo",
    "founder",
    "officer",
    "consultant",
    "analyst",
    "designer",
    "architect",
    "specialist",
    "coordinator",
    "executive",
    "lead",
    "head of",
    "partner",
    "scientist",
    "administrator",
    "advisor",
    "strategist",
];

/// Corporate suffixes that mark a company line.
const COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "inc.",
    "llc",
    "l.l.c.",
    "ltd",
    "ltd.",
    "corp",
    "corp.",
    "corporation",
    "gmbh",
    "co.",
    "company",
    "group",
    "holdings",
    "technologies",
    "solutions",
    "systems",
    "labs",
    "studio",
    "agency",
    "partners",
    "ventures",
];

/// Street/suite indicators that mark an address line.
const ADDRESS_KEYWORDS: &[&str] = &[
    "street",
    "st.",
    "avenue",
    "ave",
    "ave.",
    "boulevard",
    "blvd",
    "road",
    "rd.",
    "drive",
    "dr.",
    "lane",
    "ln.",
    "suite",
    "ste",
    "ste.",
    "floor",
    "fl.",
    "p.o. box",
    "po box",
    "building",
];

/// Structured contact fields extracted from one card image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    /// Mean confidence of the retained lines, 0-1.
    pub confidence: f32,
}

impl ContactFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.title.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.website.is_none()
            && self.address.is_none()
    }
}

/// Drop lines below the confidence threshold.
pub fn filter_lines(lines: &[OcrLine], threshold: f32) -> Vec<OcrLine> {
    lines
        .iter()
        .filter(|l| l.confidence >= threshold && !l.text.trim().is_empty())
        .cloned()
        .collect()
}

/// Threshold-filtered raw text, one retained line per row.
pub fn raw_text(lines: &[OcrLine], threshold: f32) -> String {
    filter_lines(lines, threshold)
        .iter()
        .map(|l| l.text.trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract structured contact fields from OCR lines.
///
/// Heuristics run in a fixed order so that pattern-matched fields (email,
/// phone, website) never compete with shape-matched ones (name, title,
/// company, address). Each field is assigned at most once.
pub fn extract_fields(lines: &[OcrLine], threshold: f32) -> ContactFields {
    let retained = filter_lines(lines, threshold);
    if retained.is_empty() {
        return ContactFields::default();
    }

    let texts: Vec<&str> = retained.iter().map(|l| l.text.trim()).collect();
    let joined = texts.join("\n");

    let email = EMAIL_RE.find(&joined).map(|m| m.as_str().to_string());
    let website = find_website(&texts, email.as_deref());
    let phone = find_phone(&texts);

    let name_idx = find_name(&texts);
    let title_idx = find_title(&texts, name_idx);
    let company_idx = find_company(&texts, name_idx, title_idx);
    let address = find_address(&texts);

    let confidence =
        retained.iter().map(|l| l.confidence).sum::<f32>() / retained.len() as f32;

    ContactFields {
        name: name_idx.map(|i| texts[i].to_string()),
        title: title_idx.map(|i| texts[i].to_string()),
        company: company_idx.map(|i| texts[i].to_string()),
        email,
        phone,
        website,
        address,
        confidence,
    }
}

/// First line of 2-4 capitalized tokens with no digits that does not look
/// like a title, company, or address.
fn find_name(texts: &[&str]) -> Option<usize> {
    texts.iter().position(|line| {
        NAME_RE.is_match(line)
            && !line.chars().any(|c| c.is_ascii_digit())
            && !contains_keyword(line, TITLE_KEYWORDS)
            && !contains_keyword(line, COMPANY_SUFFIXES)
            && !contains_keyword(line, ADDRESS_KEYWORDS)
    })
}

/// Title-vocabulary match, preferring lines adjacent to the detected name.
fn find_title(texts: &[&str], name_idx: Option<usize>) -> Option<usize> {
    let mut candidates: Vec<usize> = texts
        .iter()
        .enumerate()
        .filter(|(_, line)| contains_keyword(line, TITLE_KEYWORDS) && !EMAIL_RE.is_match(line))
        .map(|(i, _)| i)
        .collect();

    if candidates.is_empty() {
        return None;
    }

    if let Some(name_idx) = name_idx {
        candidates.sort_by_key(|i| i.abs_diff(name_idx));
    }
    candidates.first().copied()
}

/// Corporate-suffix match, falling back to the line with the highest
/// uppercase-letter ratio.
fn find_company(texts: &[&str], name_idx: Option<usize>, title_idx: Option<usize>) -> Option<usize> {
    let suffix_match = texts.iter().position(|line| {
        contains_keyword(line, COMPANY_SUFFIXES)
            && !EMAIL_RE.is_match(line)
            && !contains_keyword(line, ADDRESS_KEYWORDS)
    });
    if suffix_match.is_some() {
        return suffix_match;
    }

    // Fallback: card layouts often set the company name in all caps.
    texts
        .iter()
        .enumerate()
        .filter(|(i, line)| {
            Some(*i) != name_idx
                && Some(*i) != title_idx
                && !EMAIL_RE.is_match(line)
                && !WEBSITE_RE.is_match(line)
                && !contains_keyword(line, ADDRESS_KEYWORDS)
        })
        .filter_map(|(i, line)| {
            let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
            if letters.len() < 3 {
                return None;
            }
            let upper = letters.iter().filter(|c| c.is_uppercase()).count();
            let ratio = upper as f32 / letters.len() as f32;
            if ratio >= 0.6 {
                Some((i, ratio))
            } else {
                None
            }
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Street/suite/ZIP indicator lines, joined in reading order.
fn find_address(texts: &[&str]) -> Option<String> {
    let parts: Vec<&str> = texts
        .iter()
        .filter(|line| {
            (contains_keyword(line, ADDRESS_KEYWORDS) || ZIP_RE.is_match(line))
                && !EMAIL_RE.is_match(line)
                && !is_phone_only(line)
        })
        .copied()
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// A line that is nothing but a phone number should not become an address
/// just because its digit groups resemble a ZIP code.
fn is_phone_only(line: &str) -> bool {
    let stripped: String = line
        .chars()
        .filter(|c| !c.is_ascii_digit() && !"+()-. ".contains(*c))
        .collect();
    stripped.is_empty() && line.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

fn find_phone(texts: &[&str]) -> Option<String> {
    for line in texts {
        if EMAIL_RE.is_match(line) {
            continue;
        }
        if let Some(m) = PHONE_RE.find(line) {
            let candidate = m.as_str().trim();
            let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
            // 7-15 digits covers local through full international numbers.
            if (7..=15).contains(&digits) && !is_zip_code(candidate) {
                return Some(candidate.to_string());
            }
        }
    }
    None
}

fn is_zip_code(candidate: &str) -> bool {
    let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
    digits == 5 && ZIP_RE.is_match(candidate)
}

fn find_website(texts: &[&str], email: Option<&str>) -> Option<String> {
    let email_domain = email.and_then(|e| e.split('@').nth(1));

    for line in texts {
        if EMAIL_RE.is_match(line) {
            continue;
        }
        if let Some(m) = WEBSITE_RE.find(line) {
            let candidate = m.as_str().trim_end_matches(['.', ',', ';']);
            // Skip when the "website" is just the email's domain re-detected.
            if let Some(domain) = email_domain {
                if candidate.eq_ignore_ascii_case(domain) {
                    continue;
                }
            }
            return Some(candidate.to_string());
        }
    }
    None
}

fn contains_keyword(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|kw| {
        if kw.contains(' ') || kw.contains('.') {
            lower.contains(kw)
        } else {
            lower
                .split(|c: char| !c.is_alphanumeric())
                .any(|token| token == *kw)
        }
    })
}
