use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `wolf_data::Record` for a struct whose named fields are stored
/// back to back in the file, in declaration order.
#[proc_macro_derive(Record)]
pub fn record_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(s) => match named_fields(&s.fields) {
            Ok(fields) => fields,
            Err(e) => return e.to_compile_error().into(),
        },
        _ => {
            return syn::Error::new_spanned(&input, "Record can only be derived for structs.")
                .to_compile_error()
                .into();
        }
    };

    let mut sizes = Vec::new();
    let mut readers = Vec::new();
    let mut writers = Vec::new();

    for field in fields {
        let Some(name) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;

        sizes.push(quote! { <#ty as ::wolf_data::Record>::SIZE });
        readers.push(quote! { #name: reader.read::<#ty>()? });
        writers.push(quote! { ::wolf_data::Record::write_record(&self.#name, writer); });
    }

    let expanded = quote! {
        impl #impl_generics ::wolf_data::Record for #struct_name #ty_generics #where_clause {
            const SIZE: usize = 0 #(+ #sizes)*;

            fn read_record(
                reader: &mut ::wolf_data::RecordReader<'_>,
            ) -> ::wolf_data::Result<Self> {
                Ok(Self {
                    #(#readers),*
                })
            }

            fn write_record(&self, writer: &mut ::wolf_data::RecordWriter) {
                #(#writers)*
            }
        }
    };

    TokenStream::from(expanded)
}

fn named_fields(
    fields: &Fields,
) -> syn::Result<&syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    if let Fields::Named(f) = fields {
        Ok(&f.named)
    } else {
        Err(syn::Error::new_spanned(
            fields,
            "Record on structs only supports named fields.",
        ))
    }
}
