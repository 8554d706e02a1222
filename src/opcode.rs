//! The JVMS §6 opcode set, decoded from a raw byte.
//!
//! Grounded directly in `bytecode.rs`'s `OPCode` enum and its `From<u8>` table
//! (same variant names, same byte values). That version is infallible, mapping every
//! unrecognized byte to a catch-all `Unspecified` variant; this one instead treats bytes with no
//! JVMS meaning (203-255) as a decode error, per the no-verifier-but-no-silent-garbage stance
//! this crate takes everywhere else.

use crate::error::{VmError, VmResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Opcode {
    Nop,
    AconstNull,
    IconstM1,
    Iconst0,
    Iconst1,
    Iconst2,
    Iconst3,
    Iconst4,
    Iconst5,
    Lconst0,
    Lconst1,
    Fconst0,
    Fconst1,
    Fconst2,
    Dconst0,
    Dconst1,
    BiPush,
    SiPush,
    Ldc,
    LdcW,
    Ldc2W,
    Iload,
    Lload,
    Fload,
    Dload,
    Aload,
    Iload0,
    Iload1,
    Iload2,
    Iload3,
    Lload0,
    Lload1,
    Lload2,
    Lload3,
    Fload0,
    Fload1,
    Fload2,
    Fload3,
    Dload0,
    Dload1,
    Dload2,
    Dload3,
    Aload0,
    Aload1,
    Aload2,
    Aload3,
    IAload,
    LAload,
    FAload,
    DAload,
    AAload,
    BAload,
    CAload,
    SAload,
    Istore,
    Lstore,
    Fstore,
    Dstore,
    Astore,
    Istore0,
    Istore1,
    Istore2,
    Istore3,
    Lstore0,
    Lstore1,
    Lstore2,
    Lstore3,
    Fstore0,
    Fstore1,
    Fstore2,
    Fstore3,
    Dstore0,
    Dstore1,
    Dstore2,
    Dstore3,
    Astore0,
    Astore1,
    Astore2,
    Astore3,
    IAstore,
    LAstore,
    FAstore,
    DAstore,
    AAstore,
    BAstore,
    CAstore,
    SAstore,
    Pop,
    Pop2,
    Dup,
    DupX1,
    DupX2,
    Dup2,
    Dup2X1,
    Dup2X2,
    Swap,
    IAdd,
    LAdd,
    FAdd,
    DAdd,
    ISub,
    LSub,
    FSub,
    DSub,
    IMul,
    LMul,
    FMul,
    DMul,
    IDiv,
    LDiv,
    FDiv,
    DDiv,
    IRem,
    LRem,
    FRem,
    DRem,
    INeg,
    LNeg,
    FNeg,
    DNeg,
    IShl,
    LShl,
    IShr,
    LShr,
    IUShr,
    LUShr,
    IAnd,
    LAnd,
    IOr,
    LOr,
    IXor,
    LXor,
    IInc,
    I2L,
    I2F,
    I2D,
    L2I,
    L2F,
    L2D,
    F2I,
    F2L,
    F2D,
    D2I,
    D2L,
    D2F,
    I2B,
    I2C,
    I2S,
    LCmp,
    FCmpL,
    FCmpG,
    DCmpL,
    DCmpG,
    IfEq,
    IfNe,
    IfLt,
    IfGe,
    IfGt,
    IfLe,
    IfICmpEq,
    IfICmpNe,
    IfICmpLt,
    IfICmpGe,
    IfICmpGt,
    IfICmpLe,
    IfACmpEq,
    IfACmpNe,
    Goto,
    Jsr,
    Ret,
    TableSwitch,
    LookupSwitch,
    IReturn,
    LReturn,
    FReturn,
    DReturn,
    AReturn,
    Return,
    GetStatic,
    PutStatic,
    GetField,
    PutField,
    InvokeVirtual,
    InvokeSpecial,
    InvokeStatic,
    InvokeInterface,
    InvokeDynamic,
    New,
    NewArray,
    ANewArray,
    ArrayLength,
    AThrow,
    CheckCast,
    InstanceOf,
    MonitorEnter,
    MonitorExit,
    Wide,
    MultiANewArray,
    IfNull,
    IfNonNull,
    GotoW,
    JsrW,
    Breakpoint,
}

impl TryFrom<u8> for Opcode {
    type Error = VmError;

    fn try_from(byte: u8) -> VmResult<Opcode> {
        use Opcode::*;
        Ok(match byte {
            0 => Nop,
            1 => AconstNull,
            2 => IconstM1,
            3 => Iconst0,
            4 => Iconst1,
            5 => Iconst2,
            6 => Iconst3,
            7 => Iconst4,
            8 => Iconst5,
            9 => Lconst0,
            10 => Lconst1,
            11 => Fconst0,
            12 => Fconst1,
            13 => Fconst2,
            14 => Dconst0,
            15 => Dconst1,
            16 => BiPush,
            17 => SiPush,
            18 => Ldc,
            19 => LdcW,
            20 => Ldc2W,
            21 => Iload,
            22 => Lload,
            23 => Fload,
            24 => Dload,
            25 => Aload,
            26 => Iload0,
            27 => Iload1,
            28 => Iload2,
            29 => Iload3,
            30 => Lload0,
            31 => Lload1,
            32 => Lload2,
            33 => Lload3,
            34 => Fload0,
            35 => Fload1,
            36 => Fload2,
            37 => Fload3,
            38 => Dload0,
            39 => Dload1,
            40 => Dload2,
            41 => Dload3,
            42 => Aload0,
            43 => Aload1,
            44 => Aload2,
            45 => Aload3,
            46 => IAload,
            47 => LAload,
            48 => FAload,
            49 => DAload,
            50 => AAload,
            51 => BAload,
            52 => CAload,
            53 => SAload,
            54 => Istore,
            55 => Lstore,
            56 => Fstore,
            57 => Dstore,
            58 => Astore,
            59 => Istore0,
            60 => Istore1,
            61 => Istore2,
            62 => Istore3,
            63 => Lstore0,
            64 => Lstore1,
            65 => Lstore2,
            66 => Lstore3,
            67 => Fstore0,
            68 => Fstore1,
            69 => Fstore2,
            70 => Fstore3,
            71 => Dstore0,
            72 => Dstore1,
            73 => Dstore2,
            74 => Dstore3,
            75 => Astore0,
            76 => Astore1,
            77 => Astore2,
            78 => Astore3,
            79 => IAstore,
            80 => LAstore,
            81 => FAstore,
            82 => DAstore,
            83 => AAstore,
            84 => BAstore,
            85 => CAstore,
            86 => SAstore,
            87 => Pop,
            88 => Pop2,
            89 => Dup,
            90 => DupX1,
            91 => DupX2,
            92 => Dup2,
            93 => Dup2X1,
            94 => Dup2X2,
            95 => Swap,
            96 => IAdd,
            97 => LAdd,
            98 => FAdd,
            99 => DAdd,
            100 => ISub,
            101 => LSub,
            102 => FSub,
            103 => DSub,
            104 => IMul,
            105 => LMul,
            106 => FMul,
            107 => DMul,
            108 => IDiv,
            109 => LDiv,
            110 => FDiv,
            111 => DDiv,
            112 => IRem,
            113 => LRem,
            114 => FRem,
            115 => DRem,
            116 => INeg,
            117 => LNeg,
            118 => FNeg,
            119 => DNeg,
            120 => IShl,
            121 => LShl,
            122 => IShr,
            123 => LShr,
            124 => IUShr,
            125 => LUShr,
            126 => IAnd,
            127 => LAnd,
            128 => IOr,
            129 => LOr,
            130 => IXor,
            131 => LXor,
            132 => IInc,
            133 => I2L,
            134 => I2F,
            135 => I2D,
            136 => L2I,
            137 => L2F,
            138 => L2D,
            139 => F2I,
            140 => F2L,
            141 => F2D,
            142 => D2I,
            143 => D2L,
            144 => D2F,
            145 => I2B,
            146 => I2C,
            147 => I2S,
            148 => LCmp,
            149 => FCmpL,
            150 => FCmpG,
            151 => DCmpL,
            152 => DCmpG,
            153 => IfEq,
            154 => IfNe,
            155 => IfLt,
            156 => IfGe,
            157 => IfGt,
            158 => IfLe,
            159 => IfICmpEq,
            160 => IfICmpNe,
            161 => IfICmpLt,
            162 => IfICmpGe,
            163 => IfICmpGt,
            164 => IfICmpLe,
            165 => IfACmpEq,
            166 => IfACmpNe,
            167 => Goto,
            168 => Jsr,
            169 => Ret,
            170 => TableSwitch,
            171 => LookupSwitch,
            172 => IReturn,
            173 => LReturn,
            174 => FReturn,
            175 => DReturn,
            176 => AReturn,
            177 => Return,
            178 => GetStatic,
            179 => PutStatic,
            180 => GetField,
            181 => PutField,
            182 => InvokeVirtual,
            183 => InvokeSpecial,
            184 => InvokeStatic,
            185 => InvokeInterface,
            186 => InvokeDynamic,
            187 => New,
            188 => NewArray,
            189 => ANewArray,
            190 => ArrayLength,
            191 => AThrow,
            192 => CheckCast,
            193 => InstanceOf,
            194 => MonitorEnter,
            195 => MonitorExit,
            196 => Wide,
            197 => MultiANewArray,
            198 => IfNull,
            199 => IfNonNull,
            200 => GotoW,
            201 => JsrW,
            202 => Breakpoint,
            other => return Err(VmError::InvalidOpcode(other)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_opcodes() {
        assert_eq!(Opcode::try_from(0).unwrap(), Opcode::Nop);
        assert_eq!(Opcode::try_from(177).unwrap(), Opcode::Return);
        assert_eq!(Opcode::try_from(184).unwrap(), Opcode::InvokeStatic);
    }

    #[test]
    fn rejects_bytes_with_no_jvms_meaning() {
        assert!(matches!(Opcode::try_from(203), Err(VmError::InvalidOpcode(203))));
        assert!(Opcode::try_from(255).is_err());
    }
}
