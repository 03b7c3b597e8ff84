use thiserror::Error;

/// 配准错误.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// 标记点个数不足以完成四点预配准.
    #[error("至少需要 {required} 个标记点, 实际只有 {provided} 个")]
    InsufficientPoints {
        /// 所需个数.
        required: usize,
        /// 实际个数.
        provided: usize,
    },

    /// 源点集与目标点集长度不一致.
    #[error("点集长度不一致: {source_len} vs {target_len}")]
    LengthMismatch {
        /// 源点集长度.
        source_len: usize,
        /// 目标点集长度.
        target_len: usize,
    },

    /// SVD 分解没有给出 U 或 V.
    #[error("求解刚体变换时 SVD 分解失败")]
    SvdFailed,
}

/// 配准结果.
pub type RegistrationResult<T> = Result<T, RegistrationError>;
