use bitflags::bitflags;

bitflags! {
    #[derive(Default)]
    pub struct ShaderModuleCreateFlags: u32 {
        const RESERVED = 0;
    }
}

/// `VkShaderModuleCreateInfo`. Spec §4.3: "SPIR-V code bytes (exact) and
/// `flags`." No pNext chain of its own; the identifier/inline-module
/// splicing happens on the *stage* that references a module, not here.
#[derive(Clone, Debug)]
pub struct ShaderModuleCreateInfo {
    pub flags: ShaderModuleCreateFlags,
    pub code: Vec<u32>,
}

impl ShaderModuleCreateInfo {
    pub fn code_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.code.len() * 4);
        for &word in &self.code {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        bytes
    }
}
