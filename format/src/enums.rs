//! Raw-integer conversions for the handful of closed Rust enums in
//! `fossilize_types::common` (spec §6: "numeric enums are emitted as their
//! integer value"). Everything else round-trips through its `int_newtype`
//! wrapper directly and needs no helper here.

use fossilize_types::common::{BlendFactor, BlendOp, CompareOp, LogicOp, StencilOp};

pub fn compare_op_to_raw(op: CompareOp) -> u32 {
    op as u32
}

pub fn compare_op_from_raw(v: u32) -> CompareOp {
    match v {
        1 => CompareOp::Less,
        2 => CompareOp::Equal,
        3 => CompareOp::LessOrEqual,
        4 => CompareOp::Greater,
        5 => CompareOp::NotEqual,
        6 => CompareOp::GreaterOrEqual,
        7 => CompareOp::Always,
        _ => CompareOp::Never,
    }
}

pub fn stencil_op_to_raw(op: StencilOp) -> u32 {
    op as u32
}

pub fn stencil_op_from_raw(v: u32) -> StencilOp {
    match v {
        1 => StencilOp::Zero,
        2 => StencilOp::Replace,
        3 => StencilOp::IncrementAndClamp,
        4 => StencilOp::DecrementAndClamp,
        5 => StencilOp::Invert,
        6 => StencilOp::IncrementAndWrap,
        7 => StencilOp::DecrementAndWrap,
        _ => StencilOp::Keep,
    }
}

pub fn blend_factor_to_raw(f: BlendFactor) -> u32 {
    f as u32
}

pub fn blend_factor_from_raw(v: u32) -> BlendFactor {
    match v {
        1 => BlendFactor::One,
        2 => BlendFactor::SrcColor,
        3 => BlendFactor::OneMinusSrcColor,
        4 => BlendFactor::DstColor,
        5 => BlendFactor::OneMinusDstColor,
        6 => BlendFactor::SrcAlpha,
        7 => BlendFactor::OneMinusSrcAlpha,
        8 => BlendFactor::DstAlpha,
        9 => BlendFactor::OneMinusDstAlpha,
        10 => BlendFactor::ConstantColor,
        11 => BlendFactor::OneMinusConstantColor,
        12 => BlendFactor::ConstantAlpha,
        13 => BlendFactor::OneMinusConstantAlpha,
        14 => BlendFactor::SrcAlphaSaturate,
        15 => BlendFactor::Src1Color,
        16 => BlendFactor::OneMinusSrc1Color,
        17 => BlendFactor::Src1Alpha,
        18 => BlendFactor::OneMinusSrc1Alpha,
        _ => BlendFactor::Zero,
    }
}

pub fn blend_op_to_raw(op: BlendOp) -> u32 {
    op as u32
}

pub fn blend_op_from_raw(v: u32) -> BlendOp {
    match v {
        1 => BlendOp::Subtract,
        2 => BlendOp::ReverseSubtract,
        3 => BlendOp::Min,
        4 => BlendOp::Max,
        _ => BlendOp::Add,
    }
}

pub fn logic_op_to_raw(op: LogicOp) -> u32 {
    op as u32
}

pub fn logic_op_from_raw(v: u32) -> LogicOp {
    match v {
        1 => LogicOp::And,
        2 => LogicOp::AndReverse,
        3 => LogicOp::Copy,
        4 => LogicOp::AndInverted,
        5 => LogicOp::NoOp,
        6 => LogicOp::Xor,
        7 => LogicOp::Or,
        8 => LogicOp::Nor,
        9 => LogicOp::Equivalent,
        10 => LogicOp::Invert,
        11 => LogicOp::OrReverse,
        12 => LogicOp::CopyInverted,
        13 => LogicOp::OrInverted,
        14 => LogicOp::Nand,
        15 => LogicOp::Set,
        _ => LogicOp::Clear,
    }
}
