use super::{modulation_literal, narrow, random_bits, MODULATION_SCHEME_INCLUDE};
use crate::axis::{ParameterAxis, ParameterPoint};
use crate::contract::{BlockDescriptor, BlockTest, CaseContext, CaseOutcome, TestVector};
use crate::HarnessError;
use common::types::ModulationScheme;
use interfaces::{ArrayData, ElementType, FieldKind, RecordField};
use layers::phy::short_block::MAX_MESSAGE_LENGTH;
use layers::phy::ShortBlockEncoder;
use num_traits::FromPrimitive;

/// Short block encoder with rate matching for UCI on PUCCH and PUSCH
pub struct ShortBlockEncoderTest;

impl BlockTest for ShortBlockEncoderTest {
    fn descriptor(&self) -> BlockDescriptor {
        BlockDescriptor {
            name: "short_block_encoder",
            category: "phy/upper/channel_coding/short",
            includes: vec![MODULATION_SCHEME_INCLUDE],
            fields: vec![
                RecordField::new("message_length", FieldKind::Integer),
                RecordField::new("block_length", FieldKind::Integer),
                RecordField::new("scheme", FieldKind::Label("modulation_scheme".to_string())),
                RecordField::new("message", FieldKind::File(ElementType::U8)),
                RecordField::new("encoded", FieldKind::File(ElementType::U8)),
            ],
        }
    }

    fn axes(&self) -> Vec<ParameterAxis> {
        vec![
            ParameterAxis::integers("message_length", 1..=MAX_MESSAGE_LENGTH as i64),
            ParameterAxis::integers("modulation_order", [1, 2, 4, 6, 8]),
        ]
    }

    fn generate_case(&self, ctx: &CaseContext<'_>, point: &ParameterPoint) -> Result<CaseOutcome, HarnessError> {
        let message_length: usize = narrow(point, "message_length")?;
        let order = point.int("modulation_order")?;
        let scheme = ModulationScheme::from_i64(order).ok_or_else(|| HarnessError::MalformedAxis {
            axis: "modulation_order".to_string(),
            reason: format!("no modulation of order {}", order),
        })?;

        let message = random_bits(&mut ctx.rng(), message_length);
        let encoded = ShortBlockEncoder::encode_block(&message, scheme)?;

        Ok(CaseOutcome::Generated(
            TestVector::new()
                .config("message_length", message_length)
                .config("block_length", encoded.len())
                .config("scheme", modulation_literal(scheme))
                .input("message", "input", ArrayData::Bytes(message))
                .output("encoded", "output", ArrayData::Bytes(encoded)),
        ))
    }
}
