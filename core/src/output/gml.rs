use std::io::Write;

use itertools::Itertools;
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use thiserror::Error;

use crate::{crs::crs_identifier, envelope::Envelope};

use super::number_format::format_floor_2;

/// The GML 3.2 namespace
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";

/// Errors that can occur while writing an envelope as GML
#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("unable to write GML")]
    Xml(#[from] quick_xml::Error),

    #[error("serialized GML is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Writes the envelope as a `gml:Envelope` element. Ordinates are written
/// with at most two fraction digits and rounded down, so the output is
/// lossy. Use [`super::kvp::envelope_as_kvp`] if precision matters.
pub fn write_envelope_as_gml<W>(envelope: &Envelope, writer: W) -> Result<(), SerializeError>
where
    W: Write,
{
    let mut writer = Writer::new(writer);

    let srs_name = crs_identifier(envelope.crs());
    let mut root = BytesStart::new("gml:Envelope");
    root.push_attribute(("xmlns:gml", GML_NAMESPACE));
    root.push_attribute(("srsName", srs_name.as_str()));
    writer.write_event(Event::Start(root))?;

    write_corner(&mut writer, "gml:lowerCorner", envelope.lower())?;
    write_corner(&mut writer, "gml:upperCorner", envelope.upper())?;

    writer.write_event(Event::End(BytesEnd::new("gml:Envelope")))?;
    Ok(())
}

fn write_corner<W>(
    writer: &mut Writer<W>,
    name: &str,
    ordinates: &[f64],
) -> Result<(), SerializeError>
where
    W: Write,
{
    let text = ordinates.iter().map(|&o| format_floor_2(o)).join(" ");
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Serializes the envelope as a `gml:Envelope` element into a string. See
/// [`write_envelope_as_gml`].
pub fn envelope_as_gml(envelope: &Envelope) -> Result<String, SerializeError> {
    let mut buf = Vec::new();
    write_envelope_as_gml(envelope, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use assertor::{assert_that, EqualityAssertion};
    use pretty_assertions::assert_eq;

    use crate::{
        crs::Crs,
        envelope::Envelope,
        input::xml::parse_bounding_box,
    };

    use super::envelope_as_gml;

    #[test]
    fn projected() {
        let e = Envelope::new(
            Crs::new("EPSG", "25832"),
            vec![675603.129, -12.347],
            vec![675700.0, 5.5],
        )
        .unwrap();
        assert_eq!(
            envelope_as_gml(&e).unwrap(),
            concat!(
                r#"<gml:Envelope xmlns:gml="http://www.opengis.net/gml/3.2" srsName="urn:ogc:def:crs:EPSG::25832">"#,
                "<gml:lowerCorner>675603.12 -12.35</gml:lowerCorner>",
                "<gml:upperCorner>675700 5.5</gml:upperCorner>",
                "</gml:Envelope>"
            )
        );
    }

    #[test]
    fn crs84_three_dimensions() {
        let e = Envelope::new(Crs::crs84(), vec![-180.0, -90.0, 0.0], vec![180.0, 90.0, 0.29])
            .unwrap();
        assert_eq!(
            envelope_as_gml(&e).unwrap(),
            concat!(
                r#"<gml:Envelope xmlns:gml="http://www.opengis.net/gml/3.2" srsName="urn:ogc:def:crs:OGC:1.3:CRS84">"#,
                "<gml:lowerCorner>-180 -90 0</gml:lowerCorner>",
                "<gml:upperCorner>180 90 0.29</gml:upperCorner>",
                "</gml:Envelope>"
            )
        );
    }

    #[test]
    fn readable_by_bounding_box_parser() {
        let e = Envelope::new(Crs::new("EPSG", "4326"), vec![1.25, 2.0], vec![3.0, 4.75]).unwrap();
        let record = parse_bounding_box(&envelope_as_gml(&e).unwrap()).unwrap();
        assert_that!(record.crs).is_equal_to("urn:ogc:def:crs:EPSG::4326".to_string());
        assert_that!(record.lower).is_equal_to(vec![1.25, 2.0]);
        assert_that!(record.upper).is_equal_to(vec![3.0, 4.75]);
    }
}
