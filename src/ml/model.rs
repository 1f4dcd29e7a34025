use burn::{
    nn::{
        loss::BinaryCrossEntropyLossConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::backend::AutodiffBackend,
};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct ChurnNetConfig {
    pub input_dim:    usize,
    pub hidden_units: Vec<usize>,
    pub dropout:      f64,
}

impl ChurnNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ChurnNet<B> {
        let mut hidden = Vec::with_capacity(self.hidden_units.len());
        let mut in_dim = self.input_dim;
        for &out_dim in &self.hidden_units {
            hidden.push(LinearConfig::new(in_dim, out_dim).init(device));
            in_dim = out_dim;
        }
        let output  = LinearConfig::new(in_dim, 1).init(device);
        let dropout = DropoutConfig::new(self.dropout).init();
        ChurnNet { hidden, output, dropout }
    }
}

#[derive(Module, Debug)]
pub struct ChurnNet<B: Backend> {
    pub hidden:  Vec<Linear<B>>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> ChurnNet<B> {
    /// features: [batch, input_dim] → churn logits: [batch]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 1> {
        let [batch_size, _] = features.dims();

        let mut x = features;
        for layer in &self.hidden {
            x = self.dropout.forward(burn::tensor::activation::relu(layer.forward(x)));
        }

        // Single-logit head — drop the trailing dim: [batch, 1] → [batch]
        self.output.forward(x).reshape([batch_size])
    }

    pub fn forward_loss(
        &self,
        features: Tensor<B, 2>,
        targets:  Tensor<B, 1, Int>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>)
    where
        B: AutodiffBackend,
    {
        let logits = self.forward(features);
        let bce = BinaryCrossEntropyLossConfig::new()
            .with_logits(true)
            .init(&logits.device());
        let loss = bce.forward(logits.clone(), targets);
        (loss, logits)
    }
}
