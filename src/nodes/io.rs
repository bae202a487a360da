use crate::{
    foundation::{
        core::PortType,
        error::{ArtificeError, ArtificeResult},
    },
    graph::{
        operator::{Inputs, Operator, Outputs},
        param::{ParamSpec, Params},
        port::{InputSpec, OutputSpec, PortValue},
    },
    io::{
        decode::load_image,
        encode::{SaveFormat, save_image},
    },
    nodes::{choice, int_as},
};

/// Reads an image file into a three-channel buffer.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageLoader;

impl Operator for ImageLoader {
    fn kind(&self) -> &'static str {
        "ImageLoader"
    }

    fn outputs(&self) -> Vec<OutputSpec> {
        vec![OutputSpec::new("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::path("path", "")]
    }

    fn compute(&self, _: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let path = params.path("path")?;
        if path.as_os_str().is_empty() {
            return Err(ArtificeError::computation("image loader has no path set"));
        }
        let img = load_image(path)
            .map_err(|e| ArtificeError::computation(format!("cannot load '{}': {e:#}", path.display())))?;
        Ok(Outputs::single("image", PortValue::Image(img)))
    }
}

/// Writes its input to an image file. Produces no outputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageSaver;

impl Operator for ImageSaver {
    fn kind(&self) -> &'static str {
        "ImageSaver"
    }

    fn inputs(&self) -> Vec<InputSpec> {
        vec![InputSpec::required("image", PortType::Image)]
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::path("path", ""),
            ParamSpec::choice("format", "auto", &SaveFormat::NAMES),
            ParamSpec::int("quality", 95, 1, 100),
        ]
    }

    fn compute(&self, inputs: &Inputs, params: &Params) -> ArtificeResult<Outputs> {
        let img = inputs.image("image")?;
        let path = params.path("path")?;
        if path.as_os_str().is_empty() {
            return Err(ArtificeError::computation("image saver has no path set"));
        }
        let format = choice(params, "format", SaveFormat::from_name)?;
        let quality: u8 = int_as(params, "quality")?;
        save_image(img, path, format, quality).map_err(|e| match e {
            ArtificeError::Other(e) => ArtificeError::computation(format!("{e:#}")),
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "image saved");
        Ok(Outputs::new())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/nodes/io.rs"]
mod tests;
