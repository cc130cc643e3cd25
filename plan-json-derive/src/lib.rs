//! `#[derive(Decode)]`, generating a `plan_json::Shape` implementation for a
//! struct so callers don't hand-write the field-by-field `describe`/`set_struct`
//! calls `plan_json::Shape` otherwise requires.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, LitStr};

#[proc_macro_derive(Decode, attributes(plan_json))]
pub fn derive_decode(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let expanded = match expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    };
    expanded.into()
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = input.ident.clone();
    for param in input.generics.type_params_mut() {
        param.bounds.push(syn::parse_quote!(plan_json::Shape));
        param.bounds.push(syn::parse_quote!(::core::default::Default));
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    if container_mode(&input.attrs, "raw")?.is_some() {
        return Ok(quote! {
            plan_json::shape_from_json_raw!(#name #ty_generics);
        });
    }
    if container_mode(&input.attrs, "text")?.is_some() {
        return Ok(quote! {
            plan_json::shape_from_json_text!(#name #ty_generics);
        });
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => {
                return Ok(empty_struct_impl(&name, &impl_generics, &ty_generics, where_clause));
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(&input, "Decode cannot be derived for tuple structs"));
            }
        },
        _ => return Err(syn::Error::new_spanned(&input, "Decode can only be derived for structs")),
    };

    if fields.is_empty() {
        return Ok(empty_struct_impl(&name, &impl_generics, &ty_generics, where_clause));
    }

    let mut describe_stmts = Vec::new();
    let mut field_entries = Vec::new();
    let mut offset_stmts = Vec::new();

    for field in fields {
        let field_ident = field.ident.as_ref().expect("named field");
        let field_ty = &field.ty;
        let opts = FieldOptions::parse(&field.attrs)?;
        if opts.skip {
            continue;
        }
        let json_name = opts.rename.unwrap_or_else(|| field_ident.to_string());
        let var = syn::Ident::new(&format!("__plan_json_field_{field_ident}"), field_ident.span());

        describe_stmts.push(quote! {
            let #var = compiler.describe::<#field_ty>();
        });
        if opts.string_tag {
            describe_stmts.push(quote! {
                compiler.apply_string_tag(#var, #json_name);
            });
        }
        offset_stmts.push(quote! {
            compiler.set_field_offset(#var, ::core::mem::offset_of!(#name, #field_ident));
        });
        field_entries.push(quote! {
            plan_json::plan::StructField { name: #json_name, frame: #var }
        });
    }

    Ok(quote! {
        impl #impl_generics plan_json::Shape for #name #ty_generics #where_clause {
            fn build(compiler: &mut plan_json::plan::Compiler, frame: plan_json::plan::FrameIndex) {
                #(#describe_stmts)*
                #(#offset_stmts)*
                compiler.set_struct(
                    frame,
                    ::core::mem::size_of::<#name #ty_generics>(),
                    ::core::mem::align_of::<#name #ty_generics>(),
                    vec![#(#field_entries),*],
                );
            }

            unsafe fn reset(dest: *mut u8) {
                unsafe {
                    ::core::ptr::write(dest as *mut #name #ty_generics, <#name #ty_generics as ::core::default::Default>::default());
                }
            }
        }
    })
}

fn empty_struct_impl(
    name: &syn::Ident,
    impl_generics: &syn::ImplGenerics<'_>,
    ty_generics: &syn::TypeGenerics<'_>,
    where_clause: Option<&syn::WhereClause>,
) -> TokenStream2 {
    quote! {
        impl #impl_generics plan_json::Shape for #name #ty_generics #where_clause {
            fn build(compiler: &mut plan_json::plan::Compiler, frame: plan_json::plan::FrameIndex) {
                compiler.set_struct(
                    frame,
                    ::core::mem::size_of::<#name #ty_generics>(),
                    ::core::mem::align_of::<#name #ty_generics>(),
                    Vec::new(),
                );
            }

            unsafe fn reset(dest: *mut u8) {
                unsafe {
                    ::core::ptr::write(dest as *mut #name #ty_generics, <#name #ty_generics as ::core::default::Default>::default());
                }
            }
        }
    }
}

/// Reads a container-level `#[plan_json(raw)]`/`#[plan_json(text)]` attribute, if present.
fn container_mode(attrs: &[Attribute], mode: &str) -> syn::Result<Option<()>> {
    for attr in attrs {
        if !attr.path().is_ident("plan_json") {
            continue;
        }
        let mut found = false;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(mode) {
                found = true;
            }
            Ok(())
        })?;
        if found {
            return Ok(Some(()));
        }
    }
    Ok(None)
}

#[derive(Default)]
struct FieldOptions {
    rename: Option<String>,
    skip: bool,
    string_tag: bool,
}

impl FieldOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut opts = Self::default();
        for attr in attrs {
            if !attr.path().is_ident("plan_json") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    opts.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("string") {
                    opts.string_tag = true;
                    return Ok(());
                }
                if meta.path.is_ident("rename") {
                    let value = meta.value()?;
                    let lit: LitStr = value.parse()?;
                    opts.rename = Some(lit.value());
                    return Ok(());
                }
                Err(meta.error("unrecognized plan_json field attribute"))
            })?;
        }
        Ok(opts)
    }
}
