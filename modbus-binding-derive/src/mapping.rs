use crate::entry::Entry;
use crate::utils::find_modbus_attr;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields};

#[derive(Debug, Clone)]
pub struct Mapping(pub Vec<Entry>);

impl Mapping {
    pub fn new(ast: &DeriveInput) -> Self {
        let data_struct = match ast.data.clone() {
            Data::Struct(data_struct) => data_struct,
            _ => panic!("Trait can be implemented only for a struct."),
        };

        let named_fields = match data_struct.fields {
            Fields::Named(fields_named) => fields_named.named,
            _ => panic!("Trait can be implemented only for a struct with named fields."),
        };
        let mut map: Vec<Entry> = named_fields
            .into_iter()
            .filter(|field| find_modbus_attr(&field.attrs).is_some())
            .map(From::from)
            .collect::<Vec<_>>();

        // stable, so fields at the same address keep their order
        map.sort_by_key(|x| (x.table as u8, x.addr));

        Self(map)
    }
}

impl Mapping {
    /// Split into groups of consecutive entries that may share one binding.
    ///
    /// Whether neighbours are address adjacent is only known once the native
    /// widths are, so the generated code checks it again.
    pub fn split_into_groups(self) -> Vec<Self> {
        let mut groups = vec![];

        let mut entries: Vec<Entry> = Vec::with_capacity(self.0.len());

        for entry in self.0 {
            if entries.last().is_some_and(|last| !last.continues_with(&entry)) {
                groups.push(Mapping(std::mem::take(&mut entries)));
            }
            entries.push(entry);
        }

        if !entries.is_empty() {
            groups.push(Mapping(entries));
        }

        groups
    }

    /// Statements adding the bindings of this group to `map`.
    pub fn bind_tokens(&self) -> TokenStream {
        let (first, rest) = match self.0.split_first() {
            Some(split) => split,
            None => return TokenStream::new(),
        };
        let bind: Ident = first.table.bind_method();
        let elem_ty = &first.elem_ty;
        let field_name = first.field_name_ident();
        let addr = first.addr;
        let size = first.size_tokens();

        if first.is_array() {
            return quote! {
                let cells = ::std::cell::Cell::from_mut(&mut self.#field_name[..]).as_slice_of_cells();
                map.#bind(::modbus_binding::binding::Binding::<#elem_ty>::from_cells(#addr, #size, cells)?)?;
            };
        }

        let mut tokens = quote! {
            let mut binding = ::modbus_binding::binding::Binding::<#elem_ty>::new(#addr, #size)?;
            binding.push(::std::cell::Cell::from_mut(&mut self.#field_name))?;
        };
        for entry in rest {
            let field_name = entry.field_name_ident();
            let addr = entry.addr;
            tokens.extend(quote! {
                if binding.next_address() != u32::from(#addr) {
                    let next = ::modbus_binding::binding::Binding::<#elem_ty>::new(#addr, #size)?;
                    map.#bind(::std::mem::replace(&mut binding, next))?;
                }
                binding.push(::std::cell::Cell::from_mut(&mut self.#field_name))?;
            });
        }
        tokens.extend(quote! {
            map.#bind(binding)?;
        });
        tokens
    }
}
