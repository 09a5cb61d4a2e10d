//! C6: serializes every team's channel and programme stream into a single
//! XMLTV document, written atomically.

use crate::error::{Result, TeamarrError};
use crate::models::Programme;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// One `<channel>` entry. `channel_id` must match the `channel` attribute
/// every [`Programme`] for that team carries.
#[derive(Debug, Clone)]
pub struct XmltvChannel {
    pub channel_id: String,
    pub display_name: String,
    pub icon: Option<String>,
}

/// Formats a UTC instant the way XMLTV expects: `YYYYMMDDHHmmss +0000`.
pub fn format_xmltv_datetime(dt: chrono::DateTime<chrono::Utc>) -> String {
    dt.format("%Y%m%d%H%M%S +0000").to_string()
}

/// Renders `channels` and `programmes` into a complete XMLTV document string.
/// Programmes are grouped by channel and emitted in ascending `start_utc`
/// order within each channel; channel order follows `channels`' own order.
pub fn render_xmltv(channels: &[XmltvChannel], programmes: &[Programme]) -> Result<String> {
    let estimated_size = 500 + channels.len() * 300 + programmes.len() * 300;
    let buffer = Vec::with_capacity(estimated_size);
    let mut writer = Writer::new(Cursor::new(buffer));

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)?;
    writer
        .write_event(Event::DocType(BytesText::from_escaped("tv SYSTEM \"xmltv.dtd\"")))
        .map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)?;

    let mut tv = BytesStart::new("tv");
    tv.push_attribute(("generator-info-name", "teamarr"));
    writer.write_event(Event::Start(tv)).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)?;

    for channel in channels {
        write_channel(&mut writer, channel)?;
    }

    let mut by_channel: Vec<&Programme> = programmes.iter().collect();
    by_channel.sort_by(|a, b| a.channel_id.cmp(&b.channel_id).then_with(|| a.start_utc.cmp(&b.start_utc)));
    for programme in by_channel {
        write_programme(&mut writer, programme)?;
    }

    writer.write_event(Event::End(BytesEnd::new("tv"))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)?;

    let result = writer.into_inner().into_inner();
    String::from_utf8(result).map_err(|e| TeamarrError::output_unwritable("", format!("xmltv buffer was not valid utf-8: {}", e)))
}

fn write_channel<W: std::io::Write>(writer: &mut Writer<W>, channel: &XmltvChannel) -> Result<()> {
    let mut ch = BytesStart::new("channel");
    ch.push_attribute(("id", channel.channel_id.as_str()));
    writer.write_event(Event::Start(ch)).map_err(xml_err)?;

    writer.write_event(Event::Start(BytesStart::new("display-name"))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new(&channel.display_name))).map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new("display-name"))).map_err(xml_err)?;

    if let Some(icon) = &channel.icon {
        let mut icon_elem = BytesStart::new("icon");
        icon_elem.push_attribute(("src", icon.as_str()));
        writer.write_event(Event::Empty(icon_elem)).map_err(xml_err)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel"))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)
}

fn write_programme<W: std::io::Write>(writer: &mut Writer<W>, programme: &Programme) -> Result<()> {
    let mut prog = BytesStart::new("programme");
    let start = format_xmltv_datetime(programme.start_utc);
    let stop = format_xmltv_datetime(programme.stop_utc);
    prog.push_attribute(("start", start.as_str()));
    prog.push_attribute(("stop", stop.as_str()));
    prog.push_attribute(("channel", programme.channel_id.as_str()));
    writer.write_event(Event::Start(prog)).map_err(xml_err)?;

    let mut title = BytesStart::new("title");
    title.push_attribute(("lang", "en"));
    writer.write_event(Event::Start(title)).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new(&programme.title))).map_err(xml_err)?;
    writer.write_event(Event::End(BytesEnd::new("title"))).map_err(xml_err)?;

    if let Some(subtitle) = &programme.subtitle {
        let mut sub = BytesStart::new("sub-title");
        sub.push_attribute(("lang", "en"));
        writer.write_event(Event::Start(sub)).map_err(xml_err)?;
        writer.write_event(Event::Text(BytesText::new(subtitle))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("sub-title"))).map_err(xml_err)?;
    }

    if !programme.description.is_empty() {
        let mut desc = BytesStart::new("desc");
        desc.push_attribute(("lang", "en"));
        writer.write_event(Event::Start(desc)).map_err(xml_err)?;
        writer.write_event(Event::Text(BytesText::new(&programme.description))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("desc"))).map_err(xml_err)?;
    }

    for category in &programme.categories {
        let mut cat = BytesStart::new("category");
        cat.push_attribute(("lang", "en"));
        writer.write_event(Event::Start(cat)).map_err(xml_err)?;
        writer.write_event(Event::Text(BytesText::new(category))).map_err(xml_err)?;
        writer.write_event(Event::End(BytesEnd::new("category"))).map_err(xml_err)?;
    }

    if let Some(icon) = &programme.icon {
        let mut icon_elem = BytesStart::new("icon");
        icon_elem.push_attribute(("src", icon.as_str()));
        writer.write_event(Event::Empty(icon_elem)).map_err(xml_err)?;
    }

    writer.write_event(Event::End(BytesEnd::new("programme"))).map_err(xml_err)?;
    writer.write_event(Event::Text(BytesText::new("\n"))).map_err(xml_err)
}

fn xml_err(e: quick_xml::Error) -> TeamarrError {
    TeamarrError::output_unwritable("", format!("xml encode error: {}", e))
}

/// Writes `document` to `output_path` atomically: serialize to a sibling
/// temp file, then rename into place. A crash or concurrent reader never
/// observes a partially-written XMLTV file.
pub fn write_xmltv_atomic(channels: &[XmltvChannel], programmes: &[Programme], output_path: &str) -> Result<()> {
    let document = render_xmltv(channels, programmes)?;

    let path = Path::new(output_path);
    let tmp_path = path.with_extension(format!("tmp-{}", std::process::id()));

    std::fs::write(&tmp_path, document.as_bytes())
        .map_err(|e| TeamarrError::output_unwritable(tmp_path.display().to_string(), format!("failed writing temp file: {}", e)))?;

    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        TeamarrError::output_unwritable(path.display().to_string(), format!("failed renaming into place: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProgrammeSourceKind;
    use chrono::{TimeZone, Utc};

    fn programme(channel_id: &str, start: chrono::DateTime<Utc>) -> Programme {
        Programme {
            channel_id: channel_id.to_string(),
            title: "Celtics vs Heat".to_string(),
            subtitle: Some("Regular season".to_string()),
            description: "Boston hosts Miami at TD Garden".to_string(),
            start_utc: start,
            stop_utc: start + chrono::Duration::hours(2),
            categories: vec!["Sports".to_string()],
            icon: None,
            source_kind: ProgrammeSourceKind::Game,
        }
    }

    #[test]
    fn test_format_xmltv_datetime() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 1, 19, 30, 0).unwrap();
        assert_eq!(format_xmltv_datetime(dt), "20260201193000 +0000");
    }

    #[test]
    fn test_render_includes_channel_and_programme() {
        let channels = vec![XmltvChannel { channel_id: "teamarr-team-espn-1".to_string(), display_name: "Boston Celtics".to_string(), icon: None }];
        let start = Utc.with_ymd_and_hms(2026, 2, 1, 19, 30, 0).unwrap();
        let programmes = vec![programme("teamarr-team-espn-1", start)];
        let xml = render_xmltv(&channels, &programmes).unwrap();
        assert!(xml.contains("<tv"));
        assert!(xml.contains(r#"<channel id="teamarr-team-espn-1">"#));
        assert!(xml.contains("Celtics vs Heat"));
        assert!(xml.contains(r#"channel="teamarr-team-espn-1""#));
    }

    #[test]
    fn test_xml_escapes_special_characters() {
        let channels = vec![];
        let mut p = programme("c1", Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap());
        p.title = "Team A <vs> Team B & \"Friends\"".to_string();
        let xml = render_xmltv(&channels, &[p]).unwrap();
        assert!(!xml.contains("<vs>"));
        assert!(xml.contains("&lt;vs&gt;"));
        assert!(xml.contains("&amp;"));
    }

    #[test]
    fn test_programmes_grouped_by_channel_and_sorted_by_start() {
        let t0 = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        let programmes = vec![
            programme("b", t0),
            programme("a", t0 + chrono::Duration::hours(3)),
            programme("a", t0),
        ];
        let xml = render_xmltv(&[], &programmes).unwrap();
        let a_pos = xml.find(r#"channel="a""#).unwrap();
        let b_pos = xml.find(r#"channel="b""#).unwrap();
        assert!(a_pos < b_pos);
    }

    #[test]
    fn test_write_xmltv_atomic_writes_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let output_path = dir.path().join("guide.xml");
        let channels = vec![XmltvChannel { channel_id: "c1".to_string(), display_name: "Test".to_string(), icon: None }];
        let programmes = vec![programme("c1", Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap())];
        write_xmltv_atomic(&channels, &programmes, output_path.to_str().unwrap()).unwrap();
        let contents = std::fs::read_to_string(&output_path).unwrap();
        assert!(contents.contains("<tv"));
        assert!(!output_path.with_extension(format!("tmp-{}", std::process::id())).exists());
    }
}
