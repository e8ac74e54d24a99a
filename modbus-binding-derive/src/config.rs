use crate::utils::{find_modbus_attr, get_punctuated, get_str};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordOrder {
    HighFirst,
    LowFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    BigEndian,
    LittleEndian,
}

impl From<String> for WordOrder {
    fn from(value: String) -> Self {
        match value.as_str() {
            "high_first" => WordOrder::HighFirst,
            "low_first" => WordOrder::LowFirst,
            s => panic!(
                "Invalid `words` variant \"{s}\". Use \"high_first\" or \"low_first\"."
            ),
        }
    }
}

impl From<String> for ByteOrder {
    fn from(value: String) -> Self {
        match value.as_str() {
            "be" => ByteOrder::BigEndian,
            "le" => ByteOrder::LittleEndian,
            s => panic!(
                "Invalid `bytes` variant \"{s}\". Use \"be\" for BigEndian or \"le\" for LittleEndian."
            ),
        }
    }
}

/// Register layout taken from the struct `modbus` attribute.
#[derive(Debug)]
pub struct Config {
    pub words: WordOrder,
    pub bytes: ByteOrder,
}

impl Config {
    pub fn new(ast: &DeriveInput) -> Self {
        let name = &ast.ident.to_string();

        let (words, bytes) = match find_modbus_attr(&ast.attrs) {
            Some(attr) => {
                let punctuated = get_punctuated(attr, name);
                (
                    get_str(&punctuated, "words", name).map(WordOrder::from),
                    get_str(&punctuated, "bytes", name).map(ByteOrder::from),
                )
            }
            None => (None, None),
        };

        Self {
            words: words.unwrap_or(WordOrder::HighFirst),
            bytes: bytes.unwrap_or(ByteOrder::BigEndian),
        }
    }

    /// Expression building the `Layout`, propagating its error with `?`.
    pub fn layout_tokens(&self) -> TokenStream {
        let words = match self.words {
            WordOrder::HighFirst => quote!(::modbus_binding::order::WordOrder::HighFirst),
            WordOrder::LowFirst => quote!(::modbus_binding::order::WordOrder::LowFirst),
        };
        let bytes = match self.bytes {
            ByteOrder::BigEndian => quote!(::modbus_binding::order::ByteOrder::BigEndian),
            ByteOrder::LittleEndian => quote!(::modbus_binding::order::ByteOrder::LittleEndian),
        };
        quote!(::modbus_binding::order::Layout::new(#words, #bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_config() {
        let ast: DeriveInput = parse_quote! {
            #[modbus(words = "low_first", bytes = "le")]
            struct Device {}
        };
        let config = Config::new(&ast);
        assert_eq!(config.words, WordOrder::LowFirst);
        assert_eq!(config.bytes, ByteOrder::LittleEndian);

        let ast: DeriveInput = parse_quote! {
            struct Device {}
        };
        let config = Config::new(&ast);
        assert_eq!(config.words, WordOrder::HighFirst);
        assert_eq!(config.bytes, ByteOrder::BigEndian);
    }
}
