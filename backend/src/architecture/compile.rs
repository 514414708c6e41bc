use tch::nn::{self, ModuleT, OptimizerConfig};
use tch::{Kind, TchError, Tensor};

const EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompileOptions {
    pub learning_rate: f64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
        }
    }
}

/// A model bound to its variables, an Adam optimizer, sparse categorical
/// cross-entropy and accuracy.
pub struct CompiledModel<M: ModuleT> {
    pub vs: nn::VarStore,
    pub model: M,
    pub optimizer: nn::Optimizer,
}

pub fn compile<M: ModuleT>(
    vs: nn::VarStore,
    model: M,
    options: CompileOptions,
) -> Result<CompiledModel<M>, TchError> {
    let optimizer = nn::Adam::default().build(&vs, options.learning_rate)?;
    Ok(CompiledModel {
        vs,
        model,
        optimizer,
    })
}

impl<M: ModuleT> CompiledModel<M> {
    pub fn loss(&self, xs: &Tensor, targets: &Tensor, train: bool) -> Tensor {
        let probs = self.model.forward_t(xs, train);
        sparse_categorical_crossentropy(&probs, targets)
    }

    /// Mean loss and accuracy without tracking gradients.
    pub fn evaluate(&self, xs: &Tensor, targets: &Tensor) -> (f64, f64) {
        tch::no_grad(|| {
            let probs = self.model.forward_t(xs, false);
            let loss = sparse_categorical_crossentropy(&probs, targets).double_value(&[]);
            (loss, accuracy(&probs, targets))
        })
    }
}

/// Cross-entropy of softmax outputs against integer class ids.
pub fn sparse_categorical_crossentropy(probs: &Tensor, targets: &Tensor) -> Tensor {
    let log_probs = probs.clamp(EPSILON, 1.0 - EPSILON).log();
    -log_probs
        .gather(1, &targets.unsqueeze(1), false)
        .mean(Kind::Float)
}

pub fn accuracy(probs: &Tensor, targets: &Tensor) -> f64 {
    probs
        .argmax(-1, false)
        .eq_tensor(targets)
        .to_kind(Kind::Float)
        .mean(Kind::Float)
        .double_value(&[])
}
