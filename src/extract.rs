//! XML helpers for API documents: id extraction, empty-response detection,
//! and normalization before anything is written to disk.
//!
//! Listing documents carry ids as text nodes:
//!
//! | Listing | Tag | Notes |
//! |---------|-----|-------|
//! | sittings of a term | `<ulnap>` | |
//! | speeches of a sitting | `<sorszam>` | `nincs` marks a sitting without speeches |

use anyhow::{bail, Context, Result};
use quick_xml::events::Event;
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;

use crate::models::{SessionId, SpeechId};

/// Tag holding one sitting id in a term's sitting listing.
pub const SITTING_TAG: &str = "ulnap";
/// Tag holding one speech id in a sitting's speech listing.
pub const SPEECH_TAG: &str = "sorszam";
/// Speech id text used by sittings that report no numbered speech.
pub const NO_SPEECH_PLACEHOLDER: &str = "nincs";

/// Sitting ids from a term listing, ascending and distinct.
pub fn session_ids(xml: &str) -> Result<Vec<SessionId>> {
    tagged_ids(xml, SITTING_TAG, None)
}

/// Speech ids from a sitting listing, ascending and distinct, without the
/// [`NO_SPEECH_PLACEHOLDER`] entries.
pub fn speech_ids(xml: &str) -> Result<Vec<SpeechId>> {
    tagged_ids(xml, SPEECH_TAG, Some(NO_SPEECH_PLACEHOLDER))
}

/// Collects the integer text of every `<tag>` element.
///
/// Text equal to `placeholder` is skipped. Any other non-numeric text means
/// the listing is not what we expect and is reported as an error.
fn tagged_ids(xml: &str, tag: &str, placeholder: Option<&str>) -> Result<Vec<u32>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut ids = BTreeSet::new();
    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader
            .read_event()
            .with_context(|| format!("Malformed listing while looking for <{}>", tag))?
        {
            Event::Start(e) if e.local_name().as_ref() == tag.as_bytes() => {
                inside = true;
                text.clear();
            }
            Event::Text(t) if inside => {
                text.push_str(&t.unescape()?);
            }
            Event::CData(c) if inside => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Event::End(e) if inside && e.local_name().as_ref() == tag.as_bytes() => {
                inside = false;
                let value = text.trim();
                if placeholder == Some(value) {
                    continue;
                }
                match value.parse::<u32>() {
                    Ok(id) => {
                        ids.insert(id);
                    }
                    Err(_) => bail!("Non-numeric <{}> value in listing: '{}'", tag, value),
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(ids.into_iter().collect())
}

/// True when the document is the API's "nothing here" answer: a root
/// element named `root_tag` with no children, e.g.
/// `<?xml version="1.0" encoding="utf-8"?>\n<felszolalas/>\n`.
pub fn is_empty_root(xml: &str, root_tag: &str) -> bool {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut open = false;
    loop {
        match reader.read_event() {
            Ok(Event::Decl(_) | Event::PI(_) | Event::Comment(_) | Event::DocType(_)) if !open => {}
            Ok(Event::Empty(e)) if !open => return e.local_name().as_ref() == root_tag.as_bytes(),
            Ok(Event::Start(e)) if !open => {
                if e.local_name().as_ref() != root_tag.as_bytes() {
                    return false;
                }
                open = true;
            }
            Ok(Event::Comment(_)) => {}
            Ok(Event::End(_)) => return open,
            _ => return false,
        }
    }
}

/// Re-serializes a document with one-space indentation.
///
/// Cached listings and saved speeches are stored in this form. Only
/// layout whitespace (whitespace-only text containing a line break) is
/// replaced by the new indentation; every other text node is written back
/// byte for byte, so spacing inside mixed content survives.
pub fn pretty_print(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);

    loop {
        match reader.read_event().context("Malformed XML document")? {
            Event::Eof => break,
            Event::Text(t) if is_layout_whitespace(&t) => {}
            event => writer
                .write_event(event)
                .context("Failed to serialize XML document")?,
        }
    }

    let mut out = String::from_utf8(writer.into_inner()).context("Serialized XML is not UTF-8")?;
    out.push('\n');
    Ok(out)
}

fn is_layout_whitespace(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace) && text.contains(&b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TERM_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ulesnapok>
  <ulesnap><ulnap>3</ulnap><datum>2022.05.03.</datum></ulesnap>
  <ulesnap><ulnap>1</ulnap><datum>2022.05.02.</datum></ulesnap>
  <ulesnap><ulnap> 3 </ulnap><datum>2022.05.03.</datum></ulesnap>
  <ulesnap><ulnap>2</ulnap></ulesnap>
</ulesnapok>
"#;

    const SITTING_LISTING: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<felszolalasok>
  <felszolalas><sorszam>12</sorszam></felszolalas>
  <felszolalas><sorszam>nincs</sorszam></felszolalas>
  <felszolalas><sorszam>4</sorszam></felszolalas>
  <felszolalas><sorszam>12</sorszam></felszolalas>
</felszolalasok>
"#;

    #[test]
    fn session_ids_sorted_and_distinct() {
        assert_eq!(session_ids(TERM_LISTING).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn speech_ids_skip_placeholder() {
        assert_eq!(speech_ids(SITTING_LISTING).unwrap(), vec![4, 12]);
    }

    #[test]
    fn no_matching_tags_is_empty() {
        assert!(session_ids("<ulesnapok/>").unwrap().is_empty());
        assert!(speech_ids("<felszolalasok></felszolalasok>")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn only_placeholders_is_empty() {
        let xml = "<felszolalasok><felszolalas><sorszam>nincs</sorszam></felszolalas></felszolalasok>";
        assert!(speech_ids(xml).unwrap().is_empty());
    }

    #[test]
    fn placeholder_only_applies_to_speeches() {
        let xml = "<ulesnapok><ulesnap><ulnap>nincs</ulnap></ulesnap></ulesnapok>";
        assert!(session_ids(xml).is_err());
    }

    #[test]
    fn garbage_id_is_error() {
        let xml = "<felszolalasok><felszolalas><sorszam>x1</sorszam></felszolalas></felszolalasok>";
        let err = speech_ids(xml).unwrap_err();
        assert!(err.to_string().contains("x1"));
    }

    #[test]
    fn output_is_strictly_ascending() {
        let body: String = [9, 3, 7, 3, 1, 9]
            .iter()
            .map(|n| format!("<felszolalas><sorszam>{}</sorszam></felszolalas>", n))
            .collect();
        let ids = speech_ids(&format!("<felszolalasok>{}</felszolalasok>", body)).unwrap();
        assert!(ids.len() <= 6);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ids, vec![1, 3, 7, 9]);
    }

    #[test]
    fn empty_root_detection() {
        let empty = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<felszolalas/>\n";
        assert!(is_empty_root(empty, "felszolalas"));
        assert!(is_empty_root("<ulesnapok>\n</ulesnapok>", "ulesnapok"));
        assert!(!is_empty_root(empty, "felszolalasok"));
        assert!(!is_empty_root(SITTING_LISTING, "felszolalasok"));
        assert!(!is_empty_root("", "felszolalas"));
        assert!(!is_empty_root("not xml at all", "felszolalas"));
    }

    #[test]
    fn pretty_print_keeps_content() {
        let pretty = pretty_print(SITTING_LISTING).unwrap();
        assert!(pretty.starts_with("<?xml"));
        assert!(pretty.contains("\n <felszolalas>"));
        assert_eq!(speech_ids(&pretty).unwrap(), vec![4, 12]);
    }

    #[test]
    fn pretty_print_keeps_spacing_in_mixed_content() {
        let xml = "<felszolalas><szoveg>Tisztelt <b>Ház</b> kérem, <i>a</i> <i>b</i></szoveg></felszolalas>";
        let pretty = pretty_print(xml).unwrap();
        assert!(
            pretty.contains("<szoveg>Tisztelt <b>Ház</b> kérem, <i>a</i> <i>b</i></szoveg>"),
            "mixed content changed: {}",
            pretty
        );

        let mut reader = Reader::from_str(&pretty);
        let mut text = String::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Text(t) => text.push_str(&t.unescape().unwrap()),
                Event::Eof => break,
                _ => {}
            }
        }
        assert_eq!(text.trim(), "Tisztelt Ház kérem, a b");
    }

    #[test]
    fn pretty_print_replaces_only_layout_whitespace() {
        let xml = "<felszolalas>\n    <szoveg>  elnök úr  </szoveg>\n</felszolalas>";
        let pretty = pretty_print(xml).unwrap();
        assert_eq!(
            pretty,
            "<felszolalas>\n <szoveg>  elnök úr  </szoveg>\n</felszolalas>\n"
        );
    }

    #[test]
    fn pretty_print_keeps_escapes() {
        let pretty = pretty_print("<a><b>x &amp; y</b></a>").unwrap();
        assert!(pretty.contains("x &amp; y"));
    }
}
