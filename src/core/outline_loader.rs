// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::{Error, Result};
use crate::core::scene_loader::{attributes, is_property_tag, parse_vec2, read_property, Properties};
use crate::integrators::solid::SynthesisSettings;
use crate::math::constants::Vector2f;
use crate::shapes::outline::{flatten_beziers, Circle, CubicBezier, Outline, Polygon};

/// A 2-D outline and the parameters used to fill it with spheres.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub outline: Outline,
    pub settings: SynthesisSettings,
}

pub fn load_synthesis_job<P: AsRef<Path>>(path: P) -> Result<SynthesisJob> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    log::info!("Loading synthesis job from {}.", path.display());
    parse_synthesis_job(&xml)
}

#[derive(Default)]
struct JobReader {
    defaults: HashMap<String, String>,
    job_props: Properties,
    outline_props: Properties,
    outline_kind: Option<String>,
    curves: Vec<CubicBezier>,
    vertices: Vec<Vector2f>,
    in_outline: bool,
    outline_seen: bool,
}

impl JobReader {
    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attrs = attributes(e, &self.defaults)?;
        match tag.as_str() {
            "synthesis" => {}
            "default" => {
                let name = attrs.get("name").ok_or(Error::MissingField("default.name"))?;
                let value = attrs.get("value").ok_or(Error::MissingField("default.value"))?;
                self.defaults.insert(name.clone(), value.clone());
            }
            "outline" => {
                if self.outline_seen {
                    return Err(Error::Parse("more than one <outline>".to_string()));
                }
                self.outline_kind = attrs.get("type").cloned();
                self.outline_seen = true;
                self.in_outline = true;
            }
            "curve" if self.in_outline => {
                let value = attrs.get("value").ok_or(Error::MissingField("curve.value"))?;
                self.curves.push(parse_curve(value)?);
            }
            "vertex" if self.in_outline => {
                let value = attrs.get("value").ok_or(Error::MissingField("vertex.value"))?;
                self.vertices.push(parse_vec2(value)?);
            }
            t if is_property_tag(t) => {
                let props = if self.in_outline { &mut self.outline_props } else { &mut self.job_props };
                read_property(&attrs, props, t)?;
            }
            other => log::warn!("Ignoring unknown element <{}>.", other),
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) {
        if tag == b"outline" {
            self.in_outline = false;
        }
    }

    fn finish(self) -> Result<SynthesisJob> {
        if !self.outline_seen {
            return Err(Error::MissingField("outline"));
        }
        let outline = match self.outline_kind.as_deref() {
            Some("circle") => {
                let center = match self.outline_props.raw("center") {
                    Some(v) => parse_vec2(v)?,
                    None => Vector2f::zeros(),
                };
                Outline::Circle(Circle::new(center, self.outline_props.float_or("radius", 1.0)?)?)
            }
            Some("bezier") => {
                if self.curves.is_empty() {
                    return Err(Error::MissingField("outline.curve"));
                }
                let segments = self.outline_props.usize_or("segments", 50)?;
                let points = flatten_beziers(&self.curves, segments);
                finish_polygon(points, &self.outline_props)?
            }
            Some("polygon") => finish_polygon(self.vertices, &self.outline_props)?,
            other => return Err(Error::Parse(format!("unsupported outline: {:?}", other))),
        };

        let defaults = SynthesisSettings::default();
        let p = &self.job_props;
        let settings = SynthesisSettings {
            resolution: p.usize_or("resolution", defaults.resolution)?,
            iterations: p.usize_or("iterations", defaults.iterations)?,
            max_radius: p.float_or("max_radius", defaults.max_radius)?,
            height_scale: p.float_or("height_scale", defaults.height_scale)?,
            max_attempts: p.usize_or("max_attempts", defaults.max_attempts)?,
            seed: p.u64_or("seed", defaults.seed)?,
            workers: p.usize_or("workers", defaults.workers)?,
        };
        settings.validate()?;
        Ok(SynthesisJob { outline, settings })
    }
}

fn finish_polygon(points: Vec<Vector2f>, props: &Properties) -> Result<Outline> {
    let polygon = if props.bool_or("mirror", false)? {
        Polygon::mirrored_x(&points)?
    } else {
        Polygon::new(points)?
    };
    Ok(Outline::Polygon(polygon.scaled(props.float_or("scale", 1.0)?)?))
}

pub fn parse_synthesis_job(xml: &str) -> Result<SynthesisJob> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut job = JobReader::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => job.open(&e)?,
            Event::Empty(e) => {
                job.open(&e)?;
                job.close(e.name().as_ref());
            }
            Event::End(e) => job.close(e.name().as_ref()),
            _ => {}
        }
        buf.clear();
    }

    job.finish()
}

/// Four whitespace separated `x,y` control points.
fn parse_curve(value: &str) -> Result<CubicBezier> {
    let points = value.split_whitespace().map(parse_vec2).collect::<Result<Vec<_>>>()?;
    match points.as_slice() {
        [a, b, c, d] => Ok([*a, *b, *c, *d]),
        _ => Err(Error::Parse(format!("a curve needs 4 control points: {}", value))),
    }
}

/// Right half of the heart, in drawing units, ending on the symmetry axis.
const HEART_CURVES: [[(f64, f64); 4]; 4] = [
    [(0.0, 293.481332), (63.151034, 293.481332), (271.922287, 84.131773), (301.151311, -1.335062)],
    [(301.417008, -2.069365), (321.470461, -60.706464), (346.852102, -152.539968), (278.451331, -234.937704)],
    [(278.036016, -235.522389), (262.631063, -254.079683), (179.054775, -332.691285), (70.203954, -270.282418)],
    [(69.489261, -269.997112), (23.207534, -243.461804), (0.0, -210.997784), (0.0, -210.997784)],
];

/// The heart outline rendered in the demo scene, about 3.4 units wide.
pub fn heart_outline() -> Result<Outline> {
    let curves: Vec<CubicBezier> = HEART_CURVES.iter()
        .map(|c| [Vector2f::new(c[0].0, c[0].1), Vector2f::new(c[1].0, c[1].1),
                  Vector2f::new(c[2].0, c[2].1), Vector2f::new(c[3].0, c[3].1)])
        .collect();
    let half = flatten_beziers(&curves, 50);
    Ok(Outline::Polygon(Polygon::mirrored_x(&half)?.scaled(1.0 / 200.0)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::DistanceField2;
    use std::io::Write;

    #[test]
    fn test_parse_circle_job() {
        let xml = r#"
            <synthesis>
                <default name="res" value="128"/>
                <integer name="resolution" value="$res"/>
                <integer name="iterations" value="500"/>
                <float name="max_radius" value="0.5"/>
                <integer name="seed" value="3"/>
                <outline type="circle">
                    <point name="center" value="1, 2"/>
                    <float name="radius" value="0.75"/>
                </outline>
            </synthesis>
        "#;
        let job = parse_synthesis_job(xml).unwrap();
        assert_eq!(job.settings.resolution, 128);
        assert_eq!(job.settings.iterations, 500);
        assert_eq!(job.settings.max_radius, 0.5);
        assert_eq!(job.settings.height_scale, 0.7);
        assert_eq!(job.settings.seed, 3);
        match job.outline {
            Outline::Circle(c) => {
                assert_eq!(c.center(), Vector2f::new(1.0, 2.0));
                assert_eq!(c.radius(), 0.75);
            }
            _ => panic!("expected a circle"),
        }
    }

    #[test]
    fn test_parse_mirrored_bezier_job() {
        let xml = r#"
            <synthesis>
                <outline type="bezier">
                    <boolean name="mirror" value="true"/>
                    <float name="scale" value="0.5"/>
                    <integer name="segments" value="8"/>
                    <curve value="0,2 1,2 2,1 2,0"/>
                    <curve value="2,0 2,-1 1,-2 0,-2"/>
                </outline>
            </synthesis>
        "#;
        let job = parse_synthesis_job(xml).unwrap();
        let outline = job.outline;
        assert!(outline.distance(&Vector2f::zeros()) < 0.0);
        assert!(outline.distance(&Vector2f::new(1.5, 0.0)) > 0.0);
        let b = outline.bounds();
        assert!((b.p_min.x + 1.0).abs() < 1e-9);
        assert!((b.p_max.x - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_polygon_job() {
        let xml = r#"
            <synthesis>
                <outline type="polygon">
                    <vertex value="0,0"/>
                    <vertex value="4,0"/>
                    <vertex value="0,3"/>
                </outline>
            </synthesis>
        "#;
        let job = parse_synthesis_job(xml).unwrap();
        assert!(job.outline.distance(&Vector2f::new(1.0, 1.0)) < 0.0);
    }

    #[test]
    fn test_job_errors() {
        assert!(matches!(parse_synthesis_job("<synthesis/>"), Err(Error::MissingField("outline"))));
        assert!(matches!(parse_synthesis_job("<synthesis><outline type=\"bezier\"/></synthesis>"),
                         Err(Error::MissingField("outline.curve"))));
        assert!(matches!(parse_synthesis_job("<synthesis><outline type=\"blob\"/></synthesis>"),
                         Err(Error::Parse(_))));
        assert!(parse_curve("0,0 1,1 2,2").is_err());

        let bad = r#"<synthesis><integer name="max_attempts" value="0"/><outline type="circle"/></synthesis>"#;
        assert!(matches!(parse_synthesis_job(bad), Err(Error::InvalidConfig { name: "max_attempts", .. })));
    }

    #[test]
    fn test_heart_outline() {
        let heart = heart_outline().unwrap();
        let b = heart.bounds();
        assert!((b.p_min.x + b.p_max.x).abs() < 1e-9);
        assert!(b.p_max.x > 1.4 && b.p_max.x < 1.8);
        assert!(heart.distance(&Vector2f::new(0.0, 0.0)) < 0.0);
        assert!(heart.distance(&Vector2f::new(0.0, 1.6)) > 0.0);
        // Notch between the two lobes.
        assert!(heart.distance(&Vector2f::new(0.0, -1.2)) > 0.0);
    }

    #[test]
    fn test_bundled_heart_job_matches_builtin() {
        let job = parse_synthesis_job(include_str!("../../scenes/heart.xml")).unwrap();
        assert_eq!(job.settings, SynthesisSettings::default());
        assert_eq!(job.outline, heart_outline().unwrap());
    }

    #[test]
    fn test_load_job_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<synthesis><outline type=\"circle\"/></synthesis>").unwrap();
        let job = load_synthesis_job(file.path()).unwrap();
        assert_eq!(job.settings, SynthesisSettings::default());
    }
}
