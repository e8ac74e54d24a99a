//! Macros to `derive` the `modbus-binding` traits

use proc_macro::TokenStream;
use quote::quote;

mod config;
mod entry;
mod mapping;
mod utils;

/// Derive macro to implement `modbus_binding::core::BindingSource`
#[proc_macro_derive(BindingSource, attributes(modbus))]
pub fn derive_binding_source(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let layout = config::Config::new(&ast).layout_tokens();

    let groups = mapping::Mapping::new(&ast)
        .split_into_groups()
        .iter()
        .map(mapping::Mapping::bind_tokens)
        .collect::<Vec<_>>();

    let tokens = quote! {
        impl #impl_generics ::modbus_binding::core::BindingSource for #name #ty_generics #where_clause {
            fn bind(
                &mut self,
            ) -> ::core::result::Result<::modbus_binding::map::BindingMap<'_>, ::modbus_binding::error::Error> {
                #[allow(unused_mut)]
                let mut map = ::modbus_binding::map::BindingMap::new(#layout);
                #(
                    {
                        #groups
                    }
                )*
                Ok(map)
            }
        }
    };

    tokens.into()
}

/// Document `modbus` bound fields with their table and address.
#[proc_macro_attribute]
pub fn modbus_doc(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut ast = syn::parse_macro_input!(item as syn::DeriveInput);
    match &mut ast.data {
        syn::Data::Struct(ref mut struct_data) => {
            match &mut struct_data.fields {
                syn::Fields::Named(fields_named) => {
                    for field in &mut fields_named.named {
                        if utils::find_modbus_attr(&field.attrs).is_some() {
                            let entry: entry::Entry = field.clone().into();
                            let size = match entry.size {
                                Some(size) => format!("`{size}` units per entry"),
                                None => "native width".to_string(),
                            };
                            let doc = format!(
                                "{:?} table, address - `{}`, {}.",
                                entry.table, entry.addr, size
                            );
                            let doc: syn::Attribute = syn::parse_quote!(#[doc = #doc]);
                            field.attrs.push(doc);
                        }
                    }
                }
                _ => panic!("`modbus_doc` has to be applied to structs with named fields"),
            }

            quote! {
                #ast
            }
            .into()
        }
        _ => panic!("`modbus_doc` has to be applied with structs"),
    }
}
