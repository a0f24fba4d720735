use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, parse_macro_input, spanned::Spanned};

/// Implements `structdb::Document` from the struct's fields.
///
/// The identity is the field marked `#[document(id)]`, or a field named `id`.
/// Every other field is indexed unless marked `#[document(skip)]`.
#[proc_macro_derive(Document, attributes(document))]
pub fn derive_document(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_document(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Implements `structdb::Members` for a value type embedded in documents.
#[proc_macro_derive(Members, attributes(document))]
pub fn derive_members(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_members(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct TypeOptions {
    name: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldRole {
    Index,
    Unique,
    Nested,
    Id,
    Timestamp,
    Skip,
}

struct DocumentField {
    ident: Ident,
    path: String,
    role: FieldRole,
}

fn expand_document(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident.clone();
    let options = parse_type_options(&input.attrs)?;
    let mut fields = collect_fields(&input, "Document")?;

    if !fields.iter().any(|field| field.role == FieldRole::Id) {
        if let Some(field) = fields
            .iter_mut()
            .find(|field| field.ident == "id" && field.role == FieldRole::Index)
        {
            field.role = FieldRole::Id;
        }
    }

    let name = options
        .name
        .unwrap_or_else(|| struct_name.to_string());
    let registrations = fields.iter().map(|field| {
        let ident = &field.ident;
        let path = &field.path;
        match field.role {
            FieldRole::Id => quote! {
                shape.id(#path, |item| &item.#ident, |item| &mut item.#ident);
            },
            FieldRole::Timestamp => quote! {
                shape.timestamp(#path, |item| &item.#ident, |item| &mut item.#ident);
            },
            FieldRole::Index => quote! { shape.index(#path, |item| &item.#ident); },
            FieldRole::Unique => quote! { shape.unique(#path, |item| &item.#ident); },
            FieldRole::Nested => quote! { shape.nested(#path, |item| &item.#ident); },
            FieldRole::Skip => quote! {},
        }
    });

    Ok(quote! {
        impl ::structdb::schema::Document for #struct_name {
            fn describe(shape: &mut ::structdb::schema::Shape<Self>) {
                shape.name(#name);
                #(#registrations)*
            }
        }
    })
}

fn expand_members(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident.clone();
    if input.attrs.iter().any(|attr| attr.path().is_ident("document")) {
        return Err(syn::Error::new(
            struct_name.span(),
            "Members types take no #[document(...)] type options",
        ));
    }
    let fields = collect_fields(&input, "Members")?;

    let mut registrations = Vec::new();
    for field in &fields {
        let ident = &field.ident;
        let path = &field.path;
        let registration = match field.role {
            FieldRole::Index => quote! { members.index(#path, |item| &item.#ident); },
            FieldRole::Unique => quote! { members.unique(#path, |item| &item.#ident); },
            FieldRole::Nested => quote! { members.nested(#path, |item| &item.#ident); },
            FieldRole::Skip => continue,
            FieldRole::Id | FieldRole::Timestamp => {
                return Err(syn::Error::new(
                    ident.span(),
                    "identity and timestamp members belong to the document, not to embedded values",
                ));
            }
        };
        registrations.push(registration);
    }

    Ok(quote! {
        impl ::structdb::schema::Members for #struct_name {
            fn describe_members(members: &mut ::structdb::schema::MemberSet<Self>) {
                #(#registrations)*
            }
        }
    })
}

fn collect_fields(input: &DeriveInput, derive_name: &str) -> syn::Result<Vec<DocumentField>> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            format!("{derive_name} does not support generic structs"),
        ));
    }

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new(
            input.ident.span(),
            format!("{derive_name} can only be derived for structs"),
        ));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new(
            input.ident.span(),
            format!("{derive_name} requires named fields"),
        ));
    };

    let mut fields = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), format!("{derive_name} requires named fields")))?;
        let (role, rename) = parse_field_options(&field.attrs)?;
        let path = rename.unwrap_or_else(|| ident.to_string());
        fields.push(DocumentField { ident, path, role });
    }
    Ok(fields)
}

fn parse_type_options(attrs: &[syn::Attribute]) -> syn::Result<TypeOptions> {
    let mut options = TypeOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("Unsupported document attribute. Supported: name = \"...\""))
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<(FieldRole, Option<String>)> {
    let mut role: Option<FieldRole> = None;
    let mut rename: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("document") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                rename = Some(lit.value());
                return Ok(());
            }

            let parsed = if meta.path.is_ident("id") {
                FieldRole::Id
            } else if meta.path.is_ident("timestamp") {
                FieldRole::Timestamp
            } else if meta.path.is_ident("unique") {
                FieldRole::Unique
            } else if meta.path.is_ident("nested") {
                FieldRole::Nested
            } else if meta.path.is_ident("skip") {
                FieldRole::Skip
            } else {
                return Err(meta.error(
                    "Unsupported #[document(...)] option. Supported: id, timestamp, unique, nested, skip, rename = \"...\"",
                ));
            };

            if role.is_some_and(|existing| existing != parsed) {
                return Err(meta.error("a member takes only one of id, timestamp, unique, nested, skip"));
            }
            role = Some(parsed);
            Ok(())
        })?;
    }

    let role = role.unwrap_or(FieldRole::Index);
    if role == FieldRole::Skip && rename.is_some() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "#[document(skip)] cannot be combined with rename",
        ));
    }
    Ok((role, rename))
}
