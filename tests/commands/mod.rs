mod test_convert;
mod test_language_rag;
