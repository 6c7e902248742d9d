/*!
 * Standard commercial license generation (RTF)
 */

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::error::{Result, ResultExt};

const RTF_HEADER: &str = r"{\rtf1\ansi\ansicpg1252\deff0\nouicompat\deflang1033{\fonttbl{\f0\fnil\fcharset0 Calibri;}{\f1\fnil\fcharset0 Arial;}}\viewkind4\uc1\pard\sa200\sl276\slmult1";

/// File name of the generated license for a product
pub fn license_file_name(product_name: &str) -> String {
    format!("{}_License.rtf", product_name)
}

/// Write `<product>_License.rtf` into `output_dir` and return its path
pub fn generate_license_rtf(company: &str, product: &str, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

    let path = output_dir.join(license_file_name(product));
    let date = Local::now().format("%B %d, %Y").to_string();
    fs::write(&path, render_license(company, product, &date))
        .with_context(|| format!("writing {}", path.display()))?;

    info!("License file generated at: {}", path.display());
    Ok(path)
}

/// RTF license text for a company and product, dated `date`
pub fn render_license(company: &str, product: &str, date: &str) -> String {
    let company = rtf_escape(company);
    let product = rtf_escape(product);

    let sections = [
        (
            "1. GRANT OF LICENSE",
            format!(
                "{company} grants you the right to install and use copies of the SOFTWARE on your devices, \
                 and to reproduce and distribute true and complete copies of the SOFTWARE accompanied by this Agreement."
            ),
        ),
        (
            "2. RESTRICTIONS",
            "You must not remove or alter any copyright notices. You may not reverse engineer, decompile or \
             disassemble the SOFTWARE except where applicable law expressly permits it. You may not rent, lease or \
             lend the SOFTWARE."
                .to_string(),
        ),
        (
            "3. TERMINATION",
            format!(
                "{company} may terminate this Agreement if you fail to comply with its terms. \
                 You must then destroy all copies of the SOFTWARE in your possession."
            ),
        ),
        (
            "4. COPYRIGHT",
            format!(
                "All title and copyrights in and to the SOFTWARE are owned by {company} or its suppliers. \
                 All rights not expressly granted are reserved by {company}."
            ),
        ),
        (
            "5. NO WARRANTIES",
            format!(
                "The SOFTWARE is provided 'As Is' without warranty of any kind. {company} disclaims all implied \
                 warranties including merchantability and fitness for a particular purpose."
            ),
        ),
        (
            "6. LIMITATION OF LIABILITY",
            format!(
                "In no event shall {company} be liable for any damages arising out of the use of or inability \
                 to use the SOFTWARE, even if advised of the possibility of such damages."
            ),
        ),
        (
            "7. GOVERNING LAW",
            format!(
                "This Agreement is governed by the laws of the jurisdiction in which {company} is registered."
            ),
        ),
        (
            "8. ENTIRE AGREEMENT",
            format!(
                "This Agreement is the entire agreement between you and {company} relating to the SOFTWARE."
            ),
        ),
    ];

    let mut body = String::new();
    body.push_str("\n\\f1\\fs28\\b SOFTWARE LICENSE AGREEMENT\\par\n\\fs24\\b0\n");
    body.push_str(&format!(
        "\\b IMPORTANT - READ CAREFULLY:\\b0  This License Agreement is a legal agreement between you and \
         {company} for the software product {product} (\"SOFTWARE\"). By installing, copying, or otherwise \
         using the SOFTWARE, you agree to be bound by the terms of this Agreement.\\par\n\n"
    ));
    for (title, text) in sections {
        body.push_str(&format!("\\b {}\\b0 \\par\n{}\\par\n\n", title, text));
    }
    body.push_str(&format!("This license is effective as of {}.\\par\n{}\n", date, company));

    format!("{}{}}}", RTF_HEADER, body)
}

/// Escape RTF control characters and non-ASCII text
fn rtf_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(c);
            }
            c if c.is_ascii() => escaped.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    escaped.push_str(&format!("\\u{}?", *unit as i16));
                }
            }
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn license_names_company_and_product() {
        let rtf = render_license("Acme {Ltd}", "Rocket", "January 01, 2026");
        assert!(rtf.starts_with(r"{\rtf1"));
        assert!(rtf.ends_with('}'));
        assert!(rtf.contains(r"Acme \{Ltd\}"));
        assert!(rtf.contains("Rocket"));
        assert!(rtf.contains("January 01, 2026"));
    }

    #[test]
    fn non_ascii_is_escaped() {
        assert_eq!(rtf_escape("é"), "\\u233?");
    }

    #[test]
    fn writes_license_into_output_dir() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("Installer");
        let path = generate_license_rtf("Acme", "Rocket", &out).unwrap();
        assert_eq!(path, out.join("Rocket_License.rtf"));
        assert!(fs::read_to_string(path).unwrap().contains("Acme"));
    }
}
