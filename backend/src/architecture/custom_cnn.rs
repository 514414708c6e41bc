use tch::{Kind, nn};

use super::IMG_SIZE;

pub const CONV_CHANNELS: [i64; 3] = [32, 64, 128];
pub const HIDDEN_UNITS: i64 = 128;
const KERNEL: i64 = 3;

/// Spatial side after the conv/pool stack: each block loses two pixels to the
/// unpadded 3×3 kernel and then halves.
pub fn feature_side(input: i64) -> i64 {
    CONV_CHANNELS
        .iter()
        .fold(input, |side, _| (side - (KERNEL - 1)) / 2)
}

/// Three conv(3×3)+ReLU+maxpool(2) blocks, a 128-unit hidden layer and a
/// softmax output.
pub fn custom_cnn(p: &nn::Path, num_classes: i64) -> nn::SequentialT {
    let mut seq = nn::seq_t();
    let mut in_channels = 3;
    for (i, &out_channels) in CONV_CHANNELS.iter().enumerate() {
        seq = seq
            .add(nn::conv2d(
                p / format!("conv{}", i + 1),
                in_channels,
                out_channels,
                KERNEL,
                Default::default(),
            ))
            .add_fn(|xs| xs.relu().max_pool2d_default(2));
        in_channels = out_channels;
    }

    let side = feature_side(IMG_SIZE);
    let flattened = in_channels * side * side;
    seq.add_fn(|xs| xs.flat_view())
        .add(nn::linear(p / "fc1", flattened, HIDDEN_UNITS, Default::default()))
        .add_fn(|xs| xs.relu())
        .add(nn::linear(p / "fc2", HIDDEN_UNITS, num_classes, Default::default()))
        .add_fn(|xs| xs.softmax(-1, Kind::Float))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::nn::ModuleT;
    use tch::{Device, Tensor};

    #[test]
    fn feature_side_for_224() {
        assert_eq!(feature_side(224), 26);
    }

    #[test]
    fn outputs_a_distribution_per_image() {
        let vs = nn::VarStore::new(Device::Cpu);
        let model = custom_cnn(&vs.root(), 10);
        let xs = Tensor::rand([2, 3, IMG_SIZE, IMG_SIZE], (Kind::Float, Device::Cpu));
        let probs = tch::no_grad(|| model.forward_t(&xs, false));
        assert_eq!(probs.size(), vec![2, 10]);
        let total = probs.sum(Kind::Float).double_value(&[]);
        assert!((total - 2.0).abs() < 1e-4);
    }
}
