/*++

Licensed under the Apache-2.0 license.

File Name:

    array.rs

Abstract:

    File contains the fixed-width word arrays used to carry digests, scalars
    and coordinates between the crypto drivers and their callers.

--*/

macro_rules! array4 {
    ($dim: literal) => {
        paste::paste! {
             pub const [<ARRAY_4X $dim _BYTE_SIZE>]: usize = $dim * core::mem::size_of::<u32>();
             pub const [<ARRAY_4X $dim _WORD_SIZE>]: usize = $dim ;

             #[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
             pub struct [<Array4x $dim>](pub [u32; [<ARRAY_4X $dim _WORD_SIZE>]]);

             impl From<[u8; [<ARRAY_4X $dim _BYTE_SIZE>]]> for [<Array4x $dim>] {
                 #[inline(never)]
                 fn from(value: [u8; [<ARRAY_4X $dim _BYTE_SIZE>]]) -> Self {
                     Self::from(&value)
                 }
             }

             impl From<[<Array4x $dim>]> for [u8; [<ARRAY_4X $dim _BYTE_SIZE>]] {
                 #[inline(never)]
                 fn from(value: [<Array4x $dim>]) -> Self {
                     let mut result = [0u8; [<ARRAY_4X $dim _BYTE_SIZE>]];

                     for (chunk, word) in result.chunks_exact_mut(4).zip(value.0.iter()) {
                         chunk.copy_from_slice(&word.to_be_bytes());
                     }

                     result
                 }
             }

             impl<'a> From<&'a [u8; [<ARRAY_4X $dim _BYTE_SIZE>]]> for [<Array4x $dim>] {
                 #[inline(never)]
                 fn from(value: &'a [u8; [<ARRAY_4X $dim _BYTE_SIZE>]]) -> Self {
                     let mut result = [<Array4x $dim>]([0u32; [<ARRAY_4X $dim _WORD_SIZE>]]);

                     for (word, chunk) in result.0.iter_mut().zip(value.chunks_exact(4)) {
                         let mut bytes = [0u8; 4];
                         bytes.copy_from_slice(chunk);
                         *word = u32::from_be_bytes(bytes);
                     }

                     result
                 }
             }

             impl From<[u32; [<ARRAY_4X $dim _WORD_SIZE>]]> for [<Array4x $dim>] {
                 #[inline(never)]
                 fn from(value: [u32; [<ARRAY_4X $dim _WORD_SIZE>]]) -> Self {
                     [<Array4x $dim>](value)
                 }
             }

             impl From<[<Array4x $dim>]> for [u32; [<ARRAY_4X $dim _WORD_SIZE>]] {
                 #[inline(never)]
                 fn from(value: [<Array4x $dim>]) -> Self {
                     value.0
                 }
             }

             impl zeroize::Zeroize for [<Array4x $dim>] {
                 fn zeroize(&mut self) {
                     self.0.zeroize();
                 }
             }
        }
    };
}

array4!(8);
