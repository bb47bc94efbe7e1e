// Copyright @yucwang 2026

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::bsdf::BSDF;
use crate::core::convergence::ConvergenceCriterion;
use crate::core::error::{Error, Result};
use crate::core::roulette::RouletteTerminator;
use crate::core::scene::{Scene, SceneObject};
use crate::core::shape::Shape;
use crate::materials::blend::BlendBSDF;
use crate::materials::dielectric::DielectricBSDF;
use crate::materials::lambertian_diffuse::LambertianDiffuseBSDF;
use crate::materials::mirror::MirrorBSDF;
use crate::math::constants::{Float, Vector2f, Vector3f, PI};
use crate::math::spectrum::RGBSpectrum;
use crate::renderers::adaptive::RenderSettings;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::cube::Cube;
use crate::shapes::sphere::Sphere;

pub struct SceneLoadResult {
    pub scene: Scene,
    pub sensor: PerspectiveCamera,
    pub settings: RenderSettings,
}

pub fn load_scene<P: AsRef<Path>>(path: P) -> Result<SceneLoadResult> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    log::info!("Loading scene from {}.", path.display());
    parse_scene(&xml)
}

/// Named `<float>`, `<integer>`, `<rgb>`, ... values collected inside one
/// element, already `$default` substituted.
#[derive(Debug, Default, Clone)]
pub(crate) struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    pub(crate) fn insert(&mut self, name: String, value: String) {
        self.values.insert(name, value);
    }

    pub(crate) fn extend(&mut self, other: Properties) {
        self.values.extend(other.values);
    }

    pub(crate) fn raw(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(|v| v.as_str())
    }

    pub(crate) fn float(&self, name: &str) -> Result<Option<Float>> {
        self.raw(name).map(parse_float).transpose()
    }

    pub(crate) fn float_or(&self, name: &str, default: Float) -> Result<Float> {
        Ok(self.float(name)?.unwrap_or(default))
    }

    pub(crate) fn u64_or(&self, name: &str, default: u64) -> Result<u64> {
        Ok(self.raw(name).map(parse_u64).transpose()?.unwrap_or(default))
    }

    pub(crate) fn u32_or(&self, name: &str, default: u32) -> Result<u32> {
        Ok(self.raw(name).map(parse_u32).transpose()?.unwrap_or(default))
    }

    pub(crate) fn usize_or(&self, name: &str, default: usize) -> Result<usize> {
        Ok(self.raw(name).map(parse_usize).transpose()?.unwrap_or(default))
    }

    pub(crate) fn bool_or(&self, name: &str, default: bool) -> Result<bool> {
        Ok(self.raw(name).map(parse_bool).transpose()?.unwrap_or(default))
    }

    pub(crate) fn rgb_or(&self, name: &str, default: RGBSpectrum) -> Result<RGBSpectrum> {
        Ok(self.raw(name).map(parse_vec3_spectrum).transpose()?.unwrap_or(default))
    }

    pub(crate) fn vec3(&self, name: &str, field: &'static str) -> Result<Vector3f> {
        parse_vec3(self.raw(name).ok_or(Error::MissingField(field))?)
    }
}

/// Collects the attributes of `e` with values resolved against `defaults`.
pub(crate) fn attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| Error::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()?;
        out.insert(key, resolve_value(&value, defaults));
    }
    Ok(out)
}

pub(crate) fn is_property_tag(tag: &str) -> bool {
    matches!(tag, "float" | "integer" | "rgb" | "point" | "string" | "boolean")
}

/// Records a `<default name value>` or a property into `props`.
pub(crate) fn read_property(attrs: &HashMap<String, String>, props: &mut Properties, tag: &str) -> Result<()> {
    let name = attrs.get("name").ok_or_else(|| Error::Parse(format!("<{}> without a name", tag)))?;
    let value = attrs.get("value").ok_or_else(|| Error::Parse(format!("<{} name=\"{}\"> without a value", tag, name)))?;
    props.insert(name.clone(), value.clone());
    Ok(())
}

struct Frame {
    tag: String,
    kind: Option<String>,
    id: Option<String>,
    props: Properties,
    refs: Vec<String>,
    lookat: Option<(Vector3f, Vector3f, Vector3f)>,
    emission: Option<RGBSpectrum>,
}

impl Frame {
    fn new(tag: &str, attrs: &HashMap<String, String>) -> Self {
        Self {
            tag: tag.to_string(),
            kind: attrs.get("type").cloned(),
            id: attrs.get("id").cloned(),
            props: Properties::default(),
            refs: Vec::new(),
            lookat: None,
            emission: None,
        }
    }
}

#[derive(Default)]
struct SceneBuilder {
    defaults: HashMap<String, String>,
    stack: Vec<Frame>,
    bsdfs: HashMap<String, Arc<dyn BSDF>>,
    inline_bsdfs: usize,
    scene: Scene,
    sensor: Option<PerspectiveCamera>,
    settings: Option<RenderSettings>,
}

impl SceneBuilder {
    fn open(&mut self, e: &BytesStart) -> Result<()> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
        let attrs = attributes(e, &self.defaults)?;
        match tag.as_str() {
            "scene" => {}
            "default" => {
                let mut props = Properties::default();
                read_property(&attrs, &mut props, "default")?;
                self.defaults.extend(props.values);
            }
            "integrator" | "sensor" | "film" | "transform" | "bsdf" | "shape" | "emitter" => {
                self.stack.push(Frame::new(&tag, &attrs));
            }
            t if is_property_tag(t) => {
                let frame = self.top(t)?;
                read_property(&attrs, &mut frame.props, t)?;
            }
            "lookat" => {
                let origin = parse_vec3(attrs.get("origin").ok_or(Error::MissingField("lookat.origin"))?)?;
                let target = parse_vec3(attrs.get("target").ok_or(Error::MissingField("lookat.target"))?)?;
                let up = match attrs.get("up") {
                    Some(v) => parse_vec3(v)?,
                    None => Vector3f::new(0.0, 0.0, 1.0),
                };
                self.top("lookat")?.lookat = Some((origin, target, up));
            }
            "ref" => {
                let id = attrs.get("id").ok_or(Error::MissingField("ref.id"))?.clone();
                self.top("ref")?.refs.push(id);
            }
            other => log::warn!("Ignoring unknown element <{}>.", other),
        }
        Ok(())
    }

    fn close(&mut self, tag: &[u8]) -> Result<()> {
        let tag = String::from_utf8_lossy(tag);
        if !matches!(tag.as_ref(), "integrator" | "sensor" | "film" | "transform" | "bsdf" | "shape" | "emitter") {
            return Ok(());
        }
        let frame = match self.stack.pop() {
            Some(frame) if frame.tag == tag => frame,
            _ => return Err(Error::Parse(format!("unbalanced </{}>", tag))),
        };

        match frame.tag.as_str() {
            "integrator" => self.settings = Some(build_settings(&frame)?),
            "film" => {
                let parent = self.top("film")?;
                parent.props.extend(frame.props);
            }
            "transform" => {
                let parent = self.top("transform")?;
                if frame.lookat.is_some() {
                    parent.lookat = frame.lookat;
                }
            }
            "sensor" => self.sensor = Some(build_sensor(&frame)?),
            "bsdf" => {
                let bsdf = build_bsdf(&frame, &self.bsdfs)?;
                let id = match frame.id {
                    Some(id) => id,
                    None => {
                        self.inline_bsdfs += 1;
                        let id = format!("#inline{}", self.inline_bsdfs);
                        self.top("bsdf")?.refs.push(id.clone());
                        id
                    }
                };
                self.bsdfs.insert(id, bsdf);
            }
            "emitter" => {
                let radiance = frame.props.rgb_or("radiance", RGBSpectrum::new(1.0, 1.0, 1.0))?;
                match self.stack.last_mut() {
                    Some(parent) if parent.tag == "shape" => parent.emission = Some(radiance),
                    None if frame.kind.as_deref() == Some("constant") => self.scene.set_background(radiance),
                    _ => return Err(Error::Parse(format!("unsupported emitter: {:?}", frame.kind))),
                }
            }
            "shape" => {
                let object = build_object(&frame, &self.bsdfs)?;
                self.scene.add_object(object);
            }
            _ => {}
        }
        Ok(())
    }

    fn top(&mut self, tag: &str) -> Result<&mut Frame> {
        self.stack.last_mut().ok_or_else(|| Error::Parse(format!("<{}> outside of an element", tag)))
    }

    fn finish(self) -> Result<SceneLoadResult> {
        if let Some(frame) = self.stack.last() {
            return Err(Error::Parse(format!("unclosed <{}>", frame.tag)));
        }
        let sensor = self.sensor.ok_or(Error::MissingField("sensor"))?;
        let settings = self.settings.unwrap_or_default();
        settings.validate()?;
        log::info!("Loaded {} objects ({} emitting).", self.scene.len(), self.scene.emitter_count());
        Ok(SceneLoadResult { scene: self.scene, sensor, settings })
    }
}

pub fn parse_scene(xml: &str) -> Result<SceneLoadResult> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut builder = SceneBuilder::default();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => builder.open(&e)?,
            Event::Empty(e) => {
                builder.open(&e)?;
                builder.close(e.name().as_ref())?;
            }
            Event::End(e) => builder.close(e.name().as_ref())?,
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

fn build_settings(frame: &Frame) -> Result<RenderSettings> {
    if frame.kind.as_deref() != Some("adaptive_path") {
        return Err(Error::Parse(format!("unsupported integrator: {:?}", frame.kind)));
    }
    let p = &frame.props;
    let criterion_default = ConvergenceCriterion::default();
    let roulette_default = RouletteTerminator::default();
    let settings_default = RenderSettings::default();
    Ok(RenderSettings {
        criterion: ConvergenceCriterion {
            min_samples: p.u64_or("min_samples", criterion_default.min_samples)?,
            max_samples: p.u64_or("max_samples", criterion_default.max_samples)?,
            error_margin: p.float_or("error_margin", criterion_default.error_margin)?,
            gamma: p.float_or("gamma", criterion_default.gamma)?,
            saturation_stddevs: p.float_or("saturation_stddevs", criterion_default.saturation_stddevs)?,
            saturation_level: p.float_or("saturation_level", criterion_default.saturation_level)?,
        },
        roulette: RouletteTerminator {
            min_depth: p.u32_or("min_depth", roulette_default.min_depth)?,
            max_depth: p.u32_or("max_depth", roulette_default.max_depth)?,
            delta: p.float_or("roulette_delta", roulette_default.delta)?,
            cutoff: p.float_or("cutoff", roulette_default.cutoff)?,
        },
        antialias: p.float_or("antialias", settings_default.antialias)?,
        workers: p.usize_or("workers", settings_default.workers)?,
        seed: p.u64_or("seed", settings_default.seed)?,
        show_progress: settings_default.show_progress,
    })
}

fn build_sensor(frame: &Frame) -> Result<PerspectiveCamera> {
    if frame.kind.as_deref() != Some("perspective") {
        return Err(Error::Parse(format!("unsupported sensor: {:?}", frame.kind)));
    }
    let fov_deg = frame.props.float("fov")?.ok_or(Error::MissingField("sensor.fov"))?;
    let (origin, target, up) = frame.lookat.ok_or(Error::MissingField("sensor.lookat"))?;
    let width = frame.props.raw("width").ok_or(Error::MissingField("film.width")).and_then(parse_usize)?;
    let height = frame.props.raw("height").ok_or(Error::MissingField("film.height")).and_then(parse_usize)?;
    PerspectiveCamera::new(origin, target, up, fov_deg * PI / 180.0, width, height)
}

fn build_bsdf(frame: &Frame, bsdfs: &HashMap<String, Arc<dyn BSDF>>) -> Result<Arc<dyn BSDF>> {
    let p = &frame.props;
    let white = RGBSpectrum::new(1.0, 1.0, 1.0);
    let bsdf: Arc<dyn BSDF> = match frame.kind.as_deref() {
        Some("diffuse") => Arc::new(LambertianDiffuseBSDF::new(p.rgb_or("reflectance", RGBSpectrum::new(0.5, 0.5, 0.5))?)),
        Some("mirror") | Some("conductor") => Arc::new(MirrorBSDF::new(p.rgb_or("reflectance", white)?)),
        Some("dielectric") => Arc::new(DielectricBSDF::new(
            p.float_or("int_ior", 1.5)?,
            p.float_or("ext_ior", 1.0)?,
            p.rgb_or("specular_reflectance", white)?,
            p.rgb_or("specular_transmittance", white)?,
        )?),
        Some("blend") => {
            if frame.refs.len() != 2 {
                return Err(Error::Parse(format!("blend bsdf needs 2 children, got {}", frame.refs.len())));
            }
            let a = lookup_bsdf(bsdfs, &frame.refs[0])?;
            let b = lookup_bsdf(bsdfs, &frame.refs[1])?;
            Arc::new(BlendBSDF::new(a, b, p.float_or("weight", 0.5)?))
        }
        other => return Err(Error::Parse(format!("unsupported bsdf: {:?}", other))),
    };
    Ok(bsdf)
}

fn lookup_bsdf(bsdfs: &HashMap<String, Arc<dyn BSDF>>, id: &str) -> Result<Arc<dyn BSDF>> {
    bsdfs.get(id).cloned().ok_or_else(|| Error::Parse(format!("missing bsdf ref: {}", id)))
}

fn build_object(frame: &Frame, bsdfs: &HashMap<String, Arc<dyn BSDF>>) -> Result<SceneObject> {
    let shape: Arc<dyn Shape> = match frame.kind.as_deref() {
        Some("sphere") => Arc::new(Sphere::new(
            frame.props.vec3("center", "sphere.center")?,
            frame.props.float_or("radius", 1.0)?,
        )?),
        Some("cube") => Arc::new(Cube::new(
            frame.props.vec3("min", "cube.min")?,
            frame.props.vec3("max", "cube.max")?,
        )?),
        other => return Err(Error::Parse(format!("unsupported shape: {:?}", other))),
    };

    // Emitters without a surface description absorb everything they receive.
    let material = match (frame.refs.first(), frame.emission) {
        (Some(id), _) => lookup_bsdf(bsdfs, id)?,
        (None, Some(_)) => Arc::new(LambertianDiffuseBSDF::new(RGBSpectrum::zeros())) as Arc<dyn BSDF>,
        (None, None) => return Err(Error::MissingField("shape.bsdf_ref")),
    };

    let mut object = SceneObject::new(shape, material);
    if let Some(id) = frame.id.clone() {
        object = object.with_name(id);
    }
    if let Some(radiance) = frame.emission {
        object.emission = radiance;
    }
    Ok(object)
}

/// Replaces every `$name` (name made of `[A-Za-z0-9_]`) whose whole name is
/// a known default. Unknown names are kept verbatim.
pub(crate) fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after.find(|c: char| !(c.is_ascii_alphanumeric() || c == '_')).unwrap_or(after.len());
        let name = &after[..len];
        match defaults.get(name) {
            Some(value) if !name.is_empty() => out.push_str(value),
            _ => {
                out.push('$');
                out.push_str(name);
            }
        }
        rest = &after[len..];
    }
    out.push_str(rest);
    out
}

pub(crate) fn parse_float(value: &str) -> Result<Float> {
    value.trim().parse::<Float>().map_err(|_| Error::Parse(format!("invalid float: {}", value)))
}

pub(crate) fn parse_u32(value: &str) -> Result<u32> {
    value.trim().parse::<u32>().map_err(|_| Error::Parse(format!("invalid integer: {}", value)))
}

pub(crate) fn parse_u64(value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| Error::Parse(format!("invalid integer: {}", value)))
}

pub(crate) fn parse_usize(value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| Error::Parse(format!("invalid integer: {}", value)))
}

pub(crate) fn parse_bool(value: &str) -> Result<bool> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::Parse(format!("invalid boolean: {}", other))),
    }
}

fn parse_components(value: &str) -> Result<Vec<Float>> {
    value.split(|c: char| c == ',' || c.is_whitespace())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(parse_float)
        .collect()
}

pub(crate) fn parse_vec2(value: &str) -> Result<Vector2f> {
    match parse_components(value)?.as_slice() {
        [x, y] => Ok(Vector2f::new(*x, *y)),
        _ => Err(Error::Parse(format!("invalid vec2: {}", value))),
    }
}

pub(crate) fn parse_vec3(value: &str) -> Result<Vector3f> {
    match parse_components(value)?.as_slice() {
        [x, y, z] => Ok(Vector3f::new(*x, *y, *z)),
        _ => Err(Error::Parse(format!("invalid vec3: {}", value))),
    }
}

/// `"r, g, b"` or a single gray value.
pub(crate) fn parse_vec3_spectrum(value: &str) -> Result<RGBSpectrum> {
    match parse_components(value)?.as_slice() {
        [v] => Ok(RGBSpectrum::new(*v, *v, *v)),
        [r, g, b] => Ok(RGBSpectrum::new(*r, *g, *b)),
        _ => Err(Error::Parse(format!("invalid rgb: {}", value))),
    }
}
