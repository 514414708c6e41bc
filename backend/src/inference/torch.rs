use std::path::Path;
use std::sync::Mutex;

use tch::{CModule, Device, Kind, Tensor};

use super::classifier::Classifier;
use super::labels::InputLayout;
use super::loader::ModelLoadError;
use crate::error::InferenceError;
use crate::preprocess::NormalizedTensor;

/// TorchScript classifier. `CModule` is not `Sync`, so calls are serialized.
pub struct TorchClassifier {
    model: Mutex<CModule>,
    device: Device,
    layout: InputLayout,
}

impl TorchClassifier {
    pub fn load(model_path: &Path, layout: InputLayout) -> Result<Self, ModelLoadError> {
        let device = Device::cuda_if_available();
        let mut model = CModule::load_on_device(model_path, device)
            .map_err(|e| ModelLoadError::Backend(e.to_string()))?;
        model.set_eval();
        log::info!("TorchScript module loaded on {:?}", device);
        Ok(Self {
            model: Mutex::new(model),
            device,
            layout,
        })
    }

    fn to_input(&self, input: &NormalizedTensor) -> Tensor {
        let [n, h, w, c] = NormalizedTensor::SHAPE.map(|d| d as i64);
        let nhwc = Tensor::from_slice(&input.to_vec()).view([n, h, w, c]);
        let tensor = match self.layout {
            InputLayout::Nhwc => nhwc,
            InputLayout::Nchw => nhwc.permute([0, 3, 1, 2]).contiguous(),
        };
        tensor.to_device(self.device)
    }
}

impl Classifier for TorchClassifier {
    fn predict(&self, input: &NormalizedTensor) -> Result<Vec<f32>, InferenceError> {
        let tensor = self.to_input(input);
        let model = self
            .model
            .lock()
            .map_err(|_| InferenceError::Internal("model lock poisoned".to_string()))?;
        let output = tch::no_grad(|| model.forward_ts(&[tensor]))
            .map_err(|e| InferenceError::Classifier(e.to_string()))?;
        let flat = output
            .to_kind(Kind::Float)
            .to_device(Device::Cpu)
            .view([-1]);
        Vec::<f32>::try_from(&flat).map_err(|e| InferenceError::Classifier(e.to_string()))
    }
}
