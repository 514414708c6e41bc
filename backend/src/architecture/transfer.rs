use std::path::Path;

use tch::nn::{self, Module, ModuleT};
use tch::{CModule, Device, Kind, TchError, Tensor};

#[derive(Debug, Clone, PartialEq)]
pub struct TransferConfig {
    pub num_classes: i64,
    /// Channels of the backbone's last feature map (1280 for MobileNetV2).
    pub feature_channels: i64,
    pub dropout: f64,
}

impl TransferConfig {
    pub fn new(num_classes: i64) -> Self {
        Self {
            num_classes,
            feature_channels: 1280,
            dropout: 0.2,
        }
    }
}

/// Loads a TorchScript feature extractor in eval mode.
pub fn load_backbone(path: impl AsRef<Path>, device: Device) -> Result<CModule, TchError> {
    let mut backbone = CModule::load_on_device(path, device)?;
    backbone.set_eval();
    Ok(backbone)
}

/// Frozen pretrained backbone followed by a trainable pooling/dropout/dense head.
#[derive(Debug)]
pub struct TransferModel {
    backbone: CModule,
    head: nn::SequentialT,
}

impl TransferModel {
    /// Head variables live under `p`; the backbone never registers any, so
    /// an optimizer built on the same store only updates the head.
    pub fn new(p: &nn::Path, backbone: CModule, config: &TransferConfig) -> Self {
        Self {
            backbone,
            head: head(p, config),
        }
    }
}

impl ModuleT for TransferModel {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let features = tch::no_grad(|| self.backbone.forward(xs)).detach();
        self.head.forward_t(&features, train)
    }
}

/// Global average pooling, dropout, dense softmax.
pub fn head(p: &nn::Path, config: &TransferConfig) -> nn::SequentialT {
    let dropout = config.dropout;
    nn::seq_t()
        .add_fn(|xs| xs.adaptive_avg_pool2d([1, 1]).flat_view())
        .add_fn_t(move |xs, train| xs.dropout(dropout, train))
        .add(nn::linear(
            p / "classifier",
            config.feature_channels,
            config.num_classes,
            Default::default(),
        ))
        .add_fn(|xs| xs.softmax(-1, Kind::Float))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_pools_feature_maps_into_class_probabilities() {
        let vs = nn::VarStore::new(Device::Cpu);
        let config = TransferConfig::new(10);
        let head = head(&vs.root(), &config);
        let features = Tensor::rand([3, 1280, 7, 7], (Kind::Float, Device::Cpu));
        let probs = tch::no_grad(|| head.forward_t(&features, false));
        assert_eq!(probs.size(), vec![3, 10]);
        assert_eq!(vs.trainable_variables().len(), 2);
    }
}
