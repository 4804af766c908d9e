use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DataStruct, DeriveInput, Fields};

/// Table metadata for a model struct.
///
/// Table names are the lowercased type name plus an `s`. Every named field
/// becomes a column unless it carries `#[relation]`, those are stored in a
/// junction table instead.
#[proc_macro_derive(DbTable, attributes(relation))]
pub fn derive_db_table(input: TokenStream) -> TokenStream {
    let DeriveInput { ident, data, .. } = parse_macro_input!(input);
    let singular = ident.to_string().to_lowercase();
    let plural = singular.clone() + "s";

    let fields = match data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => fields.named,
        _ => {
            return syn::Error::new(ident.span(), "DbTable needs a struct with named fields")
                .to_compile_error()
                .into()
        }
    };
    let columns = fields
        .iter()
        .filter(|field| !field.attrs.iter().any(|attr| attr.path.is_ident("relation")))
        .filter_map(|field| field.ident.as_ref().map(|ident| ident.to_string()))
        .collect::<Vec<String>>();

    quote! {
        impl crate::traits::DbTable for #ident {
            const NAME_SINGULAR: &'static str = #singular;
            const NAME_PLURAL: &'static str = #plural;
            const TABLE_NAME: &'static str = #plural;
            const COLUMNS: &'static [&'static str] = &[#(#columns),*];
        }
    }
    .into()
}
